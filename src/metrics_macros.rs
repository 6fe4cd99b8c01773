//! Metrics helper macros

/// Build a [`Labels`](crate::labels::Labels) map from `key => value` pairs.
///
/// Usage:
/// ```
/// use prometheus_exporter::labels;
/// let labels = labels! { "service" => "api", "region" => "eu" };
/// assert_eq!(labels["service"], "api");
/// ```
#[macro_export]
macro_rules! labels {
    () => {
        $crate::labels::Labels::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut labels = $crate::labels::Labels::new();
        $(
            labels.insert(::std::string::ToString::to_string(&$key), ::std::string::ToString::to_string(&$value));
        )+
        labels
    }};
}
