//! Continuous Deployment repository configuration
//!
//! Reads and writes the `repository.config` XML file created by the CD
//! "new configuration" script. Only the restore mode and the object type
//! filters are editable; other elements are not preserved on write.

use crate::errors::CdConfigError;
use quick_xml::se::Serializer;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const ROOT_ELEMENT: &str = "RepositoryConfiguration";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Editable part of a CD repository configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryConfiguration {
    pub restore_mode: Option<String>,
    pub included_object_types: Vec<String>,
    pub excluded_object_types: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ObjectTypeList {
    #[serde(rename = "ObjectType", default)]
    items: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RepositoryDocument {
    #[serde(default)]
    restore_mode: Option<String>,
    #[serde(default)]
    included_object_types: Option<ObjectTypeList>,
    #[serde(default)]
    excluded_object_types: Option<ObjectTypeList>,
}

#[derive(Serialize)]
struct RepositoryDocumentRef<'a> {
    #[serde(rename = "@xmlns:xsd")]
    xsd: &'static str,
    #[serde(rename = "@xmlns:xsi")]
    xsi: &'static str,
    #[serde(rename = "RestoreMode", skip_serializing_if = "Option::is_none")]
    restore_mode: Option<&'a str>,
    #[serde(rename = "IncludedObjectTypes")]
    included_object_types: ObjectTypeList,
    #[serde(rename = "ExcludedObjectTypes")]
    excluded_object_types: ObjectTypeList,
}

impl From<RepositoryDocument> for RepositoryConfiguration {
    fn from(doc: RepositoryDocument) -> Self {
        Self {
            restore_mode: doc.restore_mode.filter(|m| !m.trim().is_empty()),
            included_object_types: doc
                .included_object_types
                .map(|l| l.items)
                .unwrap_or_default(),
            excluded_object_types: doc
                .excluded_object_types
                .map(|l| l.items)
                .unwrap_or_default(),
        }
    }
}

/// Parse configuration XML.
pub fn parse_config(xml: &str) -> Result<RepositoryConfiguration, CdConfigError> {
    let doc: RepositoryDocument =
        quick_xml::de::from_str(xml).map_err(|e| CdConfigError::Deserialize(e.to_string()))?;
    Ok(doc.into())
}

/// Render configuration XML with the declaration and schema namespaces.
pub fn to_xml(config: &RepositoryConfiguration) -> Result<String, CdConfigError> {
    let doc = RepositoryDocumentRef {
        xsd: XSD_NAMESPACE,
        xsi: XSI_NAMESPACE,
        restore_mode: config.restore_mode.as_deref(),
        included_object_types: ObjectTypeList {
            items: config.included_object_types.clone(),
        },
        excluded_object_types: ObjectTypeList {
            items: config.excluded_object_types.clone(),
        },
    };

    let mut body = String::new();
    let mut serializer = Serializer::with_root(&mut body, Some(ROOT_ELEMENT))
        .map_err(|e| CdConfigError::Serialize(e.to_string()))?;
    serializer.indent(' ', 2);
    doc.serialize(serializer)
        .map_err(|e| CdConfigError::Serialize(e.to_string()))?;

    Ok(format!("{}\n{}\n", XML_DECLARATION, body))
}

/// Read the configuration file at `path`.
pub fn read_config(path: &Path) -> Result<RepositoryConfiguration, CdConfigError> {
    debug!("Reading CD configuration from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Overwrite the configuration file at `path`.
pub fn write_config(config: &RepositoryConfiguration, path: &Path) -> Result<(), CdConfigError> {
    debug!("Writing CD configuration to {}", path.display());
    std::fs::write(path, to_xml(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GENERATED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<RepositoryConfiguration xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <!-- After changing the included or excluded object types, you need to run the store command -->
  <RestoreMode>Create</RestoreMode>
  <IncludedObjectTypes>
    <ObjectType>cms.settingskey</ObjectType>
    <ObjectType>cms.user</ObjectType>
  </IncludedObjectTypes>
  <ExcludedObjectTypes />
  <ExcludedCodeNames />
</RepositoryConfiguration>
"#;

    #[test]
    fn test_parse_generated_config() {
        let config = parse_config(GENERATED).unwrap();
        assert_eq!(config.restore_mode.as_deref(), Some("Create"));
        assert_eq!(
            config.included_object_types,
            vec!["cms.settingskey", "cms.user"]
        );
        assert!(config.excluded_object_types.is_empty());
    }

    #[test]
    fn test_missing_lists_are_empty() {
        let config = parse_config("<RepositoryConfiguration></RepositoryConfiguration>").unwrap();
        assert_eq!(config, RepositoryConfiguration::default());
    }

    #[test]
    fn test_rendered_xml_shape() {
        let config = RepositoryConfiguration {
            restore_mode: Some("Full".to_string()),
            included_object_types: vec!["cms.class".to_string()],
            excluded_object_types: vec![],
        };
        let xml = to_xml(&config).unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains(r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema""#));
        assert!(xml.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
        assert!(xml.contains("<RestoreMode>Full</RestoreMode>"));
        assert!(xml.contains("<ObjectType>cms.class</ObjectType>"));
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repository.config");
        std::fs::write(&path, GENERATED).unwrap();

        let mut config = read_config(&path).unwrap();
        config.restore_mode = Some("CreateUpdate".to_string());
        config.excluded_object_types = vec!["cms.role".to_string()];
        write_config(&config, &path).unwrap();

        let reread = read_config(&path).unwrap();
        assert_eq!(reread, config);
    }

    #[test]
    fn test_invalid_xml_is_reported() {
        let err = parse_config("<RepositoryConfiguration><RestoreMode>").unwrap_err();
        assert!(matches!(err, CdConfigError::Deserialize(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_config(&dir.path().join("missing.config")).unwrap_err();
        assert!(matches!(err, CdConfigError::Io(_)));
    }
}
