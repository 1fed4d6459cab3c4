#![no_main]

use libfuzzer_sys::fuzz_target;
use procdeck::catalogue::CatalogueLoader;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string, ignoring invalid UTF-8
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        // Loading arbitrary YAML may fail but must not panic
        let loader = CatalogueLoader::new();
        let _ = loader.load_str(yaml_str, "fuzz");
    }
});
