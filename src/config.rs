//! Gateway configuration with builder pattern

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::hcn::binding::Library;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Only look for libraries in System32, ignoring the application directory and PATH
    pub system32_only: bool,
    pub computenetwork_dll: String,
    pub iphlpapi_dll: String,
    pub vmcompute_dll: String,
    pub ole32_dll: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            system32_only: true,
            computenetwork_dll: Library::ComputeNetwork.file_name().to_string(),
            iphlpapi_dll: Library::IpHlpApi.file_name().to_string(),
            vmcompute_dll: Library::VmCompute.file_name().to_string(),
            ole32_dll: Library::Ole32.file_name().to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: GatewayConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn library_name(&self, library: Library) -> &str {
        match library {
            Library::ComputeNetwork => &self.computenetwork_dll,
            Library::IpHlpApi => &self.iphlpapi_dll,
            Library::VmCompute => &self.vmcompute_dll,
            Library::Ole32 => &self.ole32_dll,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        for library in Library::ALL {
            let name = self.library_name(library);
            if name.trim().is_empty() {
                return Err(crate::Error::Config(format!(
                    "library name for {:?} cannot be empty",
                    library
                )));
            }
            if name.contains('\0') {
                return Err(crate::Error::Config(format!(
                    "library name for {:?} contains a NUL",
                    library
                )));
            }
            if self.system32_only && (name.contains('\\') || name.contains('/')) {
                return Err(crate::Error::Config(format!(
                    "{} is a path, but lookups are restricted to System32",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn system32_only(mut self, enabled: bool) -> Self {
        self.config.system32_only = enabled;
        self
    }

    pub fn library(mut self, library: Library, name: impl Into<String>) -> Self {
        let name = name.into();
        match library {
            Library::ComputeNetwork => self.config.computenetwork_dll = name,
            Library::IpHlpApi => self.config.iphlpapi_dll = name,
            Library::VmCompute => self.config.vmcompute_dll = name,
            Library::Ole32 => self.config.ole32_dll = name,
        }
        self
    }

    pub fn build(self) -> GatewayConfig {
        self.config
    }

    pub fn build_validated(self) -> crate::Result<GatewayConfig> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert!(config.system32_only);
        assert_eq!(config.library_name(Library::ComputeNetwork), "computenetwork.dll");
        assert_eq!(config.library_name(Library::Ole32), "ole32.dll");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = GatewayConfig::builder()
            .system32_only(false)
            .library(Library::VmCompute, r"C:\shim\vmcompute.dll")
            .build();

        assert!(!config.system32_only);
        assert_eq!(config.library_name(Library::VmCompute), r"C:\shim\vmcompute.dll");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = GatewayConfig::builder().library(Library::IpHlpApi, "  ").build();
        assert!(config.validate().is_err());

        let result = GatewayConfig::builder()
            .library(Library::ComputeNetwork, r"C:\other\computenetwork.dll")
            .build_validated();
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "system32_only": false, "vmcompute_dll": "vmcompute-test.dll" }}"#).unwrap();

        let config = GatewayConfig::load(file.path()).unwrap();
        assert!(!config.system32_only);
        assert_eq!(config.vmcompute_dll, "vmcompute-test.dll");
        assert_eq!(config.iphlpapi_dll, "iphlpapi.dll");
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(GatewayConfig::load(file.path()), Err(crate::Error::Json(_))));
    }
}
