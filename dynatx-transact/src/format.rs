//! Operation formatting
//!
//! Projects raw operation arguments onto the whitelist of fields valid
//! for an operation kind, wrapping the result under the kind's wire tag.

use dynatx_core::wire::{
    OperationArgs, OperationKind, TransactItem, PARAM_RETURN_VALUES,
    PARAM_RETURN_VALUES_ON_CONDITION_FAILURE,
};

/// Format raw arguments into a transact item for `kind`
///
/// A `ReturnValues` entry is renamed to
/// `ReturnValuesOnConditionCheckFailure` before filtering, so the
/// renamed field survives the whitelist wherever it is permitted.
/// Fields outside the kind's whitelist are silently dropped - callers
/// may pass one superset of arguments for any operation kind.
pub fn format_transact_item(kind: OperationKind, mut args: OperationArgs) -> TransactItem {
    if let Some(value) = args.remove(PARAM_RETURN_VALUES) {
        args.insert(PARAM_RETURN_VALUES_ON_CONDITION_FAILURE.to_string(), value);
    }
    let allowed = kind.allowed_fields();
    let fields = args
        .into_iter()
        .filter(|(name, _)| allowed.contains(&name.as_str()))
        .collect();
    TransactItem { kind, fields }
}
