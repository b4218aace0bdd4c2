use serde::{Deserialize, Serialize};

/// Knobs shared by decoding and encoding.
///
/// Deserializable, so it can be read from a service's configuration file;
/// missing keys take their default.
///
/// ```
/// use mk_schema::MappingOptions;
///
/// let options: MappingOptions = serde_json::from_str(r#"{"wrapper_property": "members"}"#).unwrap();
/// assert_eq!(options.wrapper_property, "members");
/// assert!(options.case_insensitive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Match property names to fields ignoring case. Default `true`.
    pub case_insensitive: bool,
    /// Root property holding wrapped collections. Default `"member"`.
    pub wrapper_property: String,
    /// Accept numeric strings such as `"42"` for numeric fields, and numbers
    /// for string fields. Default `true`.
    pub lenient_numbers: bool,
    /// Pretty-print encoded text. Default `false`.
    pub pretty: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            wrapper_property: "member".to_owned(),
            lenient_numbers: true,
            pretty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MappingOptions;

    #[test]
    fn options_load_from_ron() {
        let options: MappingOptions = ron::from_str(
            r#"(
                case_insensitive: false,
                wrapper_property: "members",
            )"#,
        )
        .unwrap();

        assert!(!options.case_insensitive);
        assert_eq!(options.wrapper_property, "members");
        assert!(options.lenient_numbers);
        assert!(!options.pretty);
    }
}
