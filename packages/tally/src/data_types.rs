use std::borrow::Cow;

/// The name of a metric, used for display and keying purposes.
///
/// Typically metric names are `&'static str` but for cases when the exact
/// set of metrics is not known in advance, we also support owned strings via `Cow`.
pub type MetricName = Cow<'static, str>;
