use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field \"{0}\"")]
    BadFieldValue(&'static str),
}

/// Location of scalar arguments such as `alpha`.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointerMode {
    /// Scalars are read on the host and passed to kernels by value
    #[default]
    Host,
    /// Scalars live in device memory and are dereferenced inside kernels
    Device,
}

/// Configuration of a device [`Handle`](crate::device::Handle)

#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HandleSettings {
    ///maximum worker threads for kernel launches
    ///choosing 0 lets the thread pool choose for itself
    #[builder(default = "0")]
    pub max_threads: u32,

    ///hardware wavefront width.  Kernels support 32 and 64 only.
    #[builder(default = "64")]
    pub wavefront_size: usize,

    ///location of scalar arguments
    #[builder(default = "PointerMode::Host")]
    pub pointer_mode: PointerMode,

    ///trace every call and print analysis summaries
    #[builder(default = "false")]
    pub verbose: bool,

    ///maximum busy-wait polls per dependency before a launch aborts.
    ///`None` waits forever.
    #[builder(default = "None", setter(strip_option))]
    pub spin_limit: Option<u64>,
}

impl Default for HandleSettings {
    fn default() -> HandleSettings {
        HandleSettingsBuilder::default().build().unwrap()
    }
}

impl HandleSettings {
    /// Checks that the settings are valid.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_wavefront_size(self.wavefront_size)
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for HandleSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        HandleSettingsBuilderError::ValidationError(e.to_string())
    }
}

impl HandleSettingsBuilder {
    /// check that the specified wavefront width is usable
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(wavefront_size) = self.wavefront_size {
            validate_wavefront_size(wavefront_size)?;
        }
        Ok(())
    }
}

// NB: widths other than 32/64 are accepted here and rejected by the
// kernels with `ArchMismatch`, in the same way a device would report them.
fn validate_wavefront_size(wavefront_size: usize) -> Result<(), SettingsError> {
    if wavefront_size == 0 {
        return Err(SettingsError::BadFieldValue("wavefront_size"));
    }
    Ok(())
}

#[test]
fn test_settings_builder() {
    let settings = HandleSettingsBuilder::default()
        .max_threads(2)
        .spin_limit(1000)
        .build()
        .unwrap();
    assert_eq!(settings.max_threads, 2);
    assert_eq!(settings.spin_limit, Some(1000));
    assert_eq!(settings.wavefront_size, 64);
    assert_eq!(settings.pointer_mode, PointerMode::Host);

    assert!(HandleSettingsBuilder::default()
        .wavefront_size(0)
        .build()
        .is_err());

    // unsupported, but not invalid, widths are left to the kernels
    assert!(HandleSettingsBuilder::default()
        .wavefront_size(16)
        .build()
        .is_ok());
}
