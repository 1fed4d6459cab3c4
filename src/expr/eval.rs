//! Stack-machine evaluation of compiled programs.

use crate::error::ExprError;
use crate::expr::program::Instr;
use crate::vars::VariableStore;

/// Evaluates an instruction list and returns the top of stack, `0.0` when
/// the stack ends empty.
pub(crate) fn evaluate(instrs: &[Instr], vars: &dyn VariableStore) -> Result<f64, ExprError> {
    let mut stack: Vec<f64> = Vec::with_capacity(8);
    run_block(instrs, &mut stack, vars)?;
    Ok(stack.last().copied().unwrap_or(0.0))
}

/// Non-zero is true, matching the simulator's RPN engine.
#[allow(clippy::float_cmp)]
pub(crate) fn truthy(value: f64) -> bool {
    value != 0.0
}

fn run_block(
    instrs: &[Instr],
    stack: &mut Vec<f64>,
    vars: &dyn VariableStore,
) -> Result<(), ExprError> {
    for instr in instrs {
        match instr {
            Instr::Push(value) => stack.push(*value),
            Instr::ReadFlag(name) => stack.push(vars.read_flag(name)?),
            Instr::ReadSim { name, index, unit } => {
                stack.push(vars.read_sim(name, *index, unit.as_deref())?);
            }
            Instr::WriteFlag(name) => {
                let value = pop(stack);
                vars.write_flag(name, value)?;
            }
            Instr::TriggerEvent { name, index } => {
                let param = pop(stack);
                vars.trigger_event(name, *index, param)?;
            }
            Instr::Eq => {
                let (a, b) = pop2(stack);
                stack.push(bool_value((a - b).abs() < f64::EPSILON));
            }
            Instr::Lt => {
                let (a, b) = pop2(stack);
                stack.push(bool_value(a < b));
            }
            Instr::Not => {
                let a = pop(stack);
                stack.push(bool_value(!truthy(a)));
            }
            Instr::And => {
                let (a, b) = pop2(stack);
                stack.push(bool_value(truthy(a) && truthy(b)));
            }
            Instr::Or => {
                let (a, b) = pop2(stack);
                stack.push(bool_value(truthy(a) || truthy(b)));
            }
            Instr::If(block) => {
                if truthy(pop(stack)) {
                    run_block(block, stack, vars)?;
                }
            }
        }
    }
    Ok(())
}

// Compile-time depth analysis keeps pops in bounds; an empty pop reads as
// zero to mirror the simulator's RPN engine.
fn pop(stack: &mut Vec<f64>) -> f64 {
    stack.pop().unwrap_or(0.0)
}

fn pop2(stack: &mut Vec<f64>) -> (f64, f64) {
    let b = pop(stack);
    let a = pop(stack);
    (a, b)
}

const fn bool_value(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use crate::error::ExprError;
    use crate::expr::Program;
    use crate::vars::{TableStore, VariableStore};

    fn eval(src: &str, store: &TableStore) -> f64 {
        Program::compile(src).unwrap().evaluate(store).unwrap()
    }

    #[test]
    fn test_operator_truth_table() {
        let store = TableStore::strict();
        let cases = [
            ("1 1 ==", 1.0),
            ("1 2 ==", 0.0),
            ("1 2 <", 1.0),
            ("2 1 <", 0.0),
            ("2 2 <", 0.0),
            ("0 !", 1.0),
            ("3 !", 0.0),
            ("1 1 &&", 1.0),
            ("1 0 &&", 0.0),
            ("0 1 ||", 1.0),
            ("0 0 ||", 0.0),
            ("2 3 && ", 1.0),
        ];
        for (src, expected) in cases {
            let got = eval(src, &store);
            assert!(
                (got - expected).abs() < f64::EPSILON,
                "{src} => {got}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_reads_resolve_through_the_store() {
        let store = TableStore::strict();
        store.set_flag("PARK_BRAKE", 1.0);
        store.set_sim("EXTERNAL POWER ON", Some(1), 0.0);

        assert!((eval("(L:PARK_BRAKE)", &store) - 1.0).abs() < f64::EPSILON);
        assert!((eval("(A:EXTERNAL POWER ON:1, BOOL) !", &store) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_write_then_read_back() {
        let store = TableStore::strict();
        let program = Program::compile("1 (>L:ELEC_BAT_1_AUTO)").unwrap();
        program.evaluate(&store).unwrap();
        assert!((store.read_flag("ELEC_BAT_1_AUTO").unwrap() - 1.0).abs() < f64::EPSILON);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_trigger_pops_its_parameter() {
        let store = TableStore::permissive();
        let value = eval("7 1 (>K:TOGGLE_EXTERNAL_POWER)", &store);
        // The trigger consumed the 1; the 7 remains as the result.
        assert!((value - 7.0).abs() < f64::EPSILON);
        assert_eq!(store.trigger_count(), 1);
    }

    #[test]
    fn test_conditional_block_taken_and_skipped() {
        let store = TableStore::permissive();
        eval("(L:EXT_PWR_AVAIL) ! if{ 1 (>K:TOGGLE_EXTERNAL_POWER) }", &store);
        assert_eq!(store.trigger_count(), 1);

        store.set_flag("EXT_PWR_AVAIL", 1.0);
        eval("(L:EXT_PWR_AVAIL) ! if{ 1 (>K:TOGGLE_EXTERNAL_POWER) }", &store);
        assert_eq!(store.trigger_count(), 1);
    }

    #[test]
    fn test_multiple_writes_in_one_program() {
        let store = TableStore::permissive();
        eval("1 (>K:2:LOGO_LIGHTS_SET) 1 (>K:2:NAV_LIGHTS_SET)", &store);
        assert_eq!(store.trigger_count(), 2);
    }

    #[test]
    fn test_unknown_flag_propagates_as_variable_error() {
        let store = TableStore::strict();
        let err = Program::compile("(L:NO_SUCH)")
            .unwrap()
            .evaluate(&store)
            .unwrap_err();
        assert!(matches!(err, ExprError::Variable(_)));
    }

    #[test]
    fn test_compound_condition_from_catalogue_data() {
        let store = TableStore::strict();
        store.set_flag("ENGINE_STATE:1", 1.0);
        store.set_flag("ENGINE_STATE:2", 1.0);
        let src = "(L:ENGINE_STATE:1) 1 == (L:ENGINE_STATE:2) 1 == &&";
        assert!((eval(src, &store) - 1.0).abs() < f64::EPSILON);

        store.set_flag("ENGINE_STATE:2", 0.0);
        assert!(eval(src, &store).abs() < f64::EPSILON);
    }
}
