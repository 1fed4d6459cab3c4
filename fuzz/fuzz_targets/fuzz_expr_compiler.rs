#![no_main]

use libfuzzer_sys::fuzz_target;
use procdeck::expr::Program;
use procdeck::vars::TableStore;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string, ignoring invalid UTF-8
    if let Ok(source) = std::str::from_utf8(data) {
        // Malformed sources must be rejected, never panic
        if let Ok(program) = Program::compile(source) {
            // Anything that compiles must evaluate without panicking;
            // permissive reads keep unknown names from short-circuiting
            let store = TableStore::permissive();
            let _ = program.evaluate(&store);
        }
    }
});
