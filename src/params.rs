use crate::model::SqlParameter;
use crate::types::Arg;

/// Bind statement arguments to named Data API parameters.
///
/// Unnamed arguments take their 1-based position as name, so `?`/`$N` markers rewritten to
/// `:N` line up. Values are sent in their textual form. No arguments yields `None`: the
/// request then carries no parameter list at all.
#[must_use]
pub fn convert_args(args: &[Arg]) -> Option<Vec<SqlParameter>> {
    if args.is_empty() {
        return None;
    }
    let params = args
        .iter()
        .enumerate()
        .map(|(idx, arg)| SqlParameter {
            name: match arg.name.as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => (idx + 1).to_string(),
            },
            value: arg.value.to_string(),
        })
        .collect();
    Some(params)
}
