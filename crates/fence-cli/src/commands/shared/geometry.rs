use std::path::Path;

use anyhow::Context;
use serde_json::Value;

/// Parse a `--geometry` argument: inline GeoJSON, or `@path` to read a file.
pub fn parse_geometry_arg(arg: &str) -> anyhow::Result<Value> {
    let (raw, source) = match arg.strip_prefix('@') {
        Some(path) => (
            std::fs::read_to_string(Path::new(path))
                .with_context(|| format!("failed to read geometry file {path}"))?,
            path,
        ),
        None => (arg.to_string(), "--geometry"),
    };
    serde_json::from_str(&raw).with_context(|| format!("invalid GeoJSON in {source}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::parse_geometry_arg;

    #[test]
    fn inline_geometry() {
        let value = parse_geometry_arg(r#"{"type":"Polygon","coordinates":[]}"#).unwrap();
        assert_eq!(value["type"], "Polygon");
    }

    #[test]
    fn file_geometry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = json!({"type": "Feature", "geometry": {"type": "Polygon", "coordinates": []}});
        write!(file, "{body}").unwrap();

        let arg = format!("@{}", file.path().display());
        assert_eq!(parse_geometry_arg(&arg).unwrap(), body);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_geometry_arg("@/nonexistent/zone.json").is_err());
    }

    #[test]
    fn malformed_inline_is_an_error() {
        assert!(parse_geometry_arg("{not json").is_err());
    }
}
