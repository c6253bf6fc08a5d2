/// Builds a measurement map from `name => value` pairs.
///
/// ```rust
/// use sonoscribe::ss_measurements;
///
/// let measurements = ss_measurements! {
///     "length" => "11.2 cm",
///     "thickness" => "4.1 cm",
/// };
/// assert_eq!(measurements.len(), 2);
/// assert_eq!(measurements["length"], "11.2 cm");
/// ```
#[macro_export]
macro_rules! ss_measurements {
    () => {
        ::std::collections::BTreeMap::<String, String>::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut measurements = ::std::collections::BTreeMap::<String, String>::new();
        $(measurements.insert(::std::string::ToString::to_string(&$name), ::std::string::ToString::to_string(&$value));)+
        measurements
    }};
}

/// Creates a [`FindingInstance`](crate::FindingInstance) with optional measurements.
///
/// ```rust
/// use sonoscribe::ss_instance;
///
/// let instance = ss_instance!("cyst-1", "diameter" => "8 mm");
/// assert_eq!(instance.id, "cyst-1");
/// assert_eq!(instance.measurements["diameter"], "8 mm");
/// ```
#[macro_export]
macro_rules! ss_instance {
    ($id:expr $(,)?) => {
        $crate::FindingInstance::new($id)
    };
    ($id:expr, $($name:expr => $value:expr),+ $(,)?) => {
        $crate::FindingInstance::new($id)
            .with_measurements($crate::ss_measurements!($($name => $value),+))
    };
}

/// Creates a [`SelectedFinding`](crate::SelectedFinding), optionally with a severity.
///
/// ```rust
/// use sonoscribe::{ss_finding, ss_instance};
///
/// let finding = ss_finding!("kidney-left", "cyst", "Simple cyst", severity = "Bosniak I")
///     .with_instance(ss_instance!("c1", "diameter" => "12 mm"));
/// assert_eq!(finding.severity.as_deref(), Some("Bosniak I"));
/// assert_eq!(finding.instances.len(), 1);
/// ```
#[macro_export]
macro_rules! ss_finding {
    ($organ:expr, $finding:expr, $name:expr $(,)?) => {
        $crate::SelectedFinding::new($organ, $finding, $name)
    };
    ($organ:expr, $finding:expr, $name:expr, severity = $severity:expr $(,)?) => {
        $crate::SelectedFinding::new($organ, $finding, $name).with_severity($severity)
    };
}
