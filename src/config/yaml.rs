/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use failure::Error;

use std::io::Read;

/// Reads a settings type from YAML, warning about keys nothing asked for.
///
/// Misspelled keys are the most common mistake in a settings file, and serde
/// silently ignores them; this reports them through `log` instead.
///
/// Implement it with `derive_yaml_read!{Type}` in the crate that defines the
/// type, so that the deserialization code is generated once, there.
pub trait YamlRead: for <'de> serde::Deserialize<'de> {
    fn from_reader(mut r: impl Read) -> Result<Self, Error>
    { YamlRead::from_dyn_reader(&mut r) }

    fn from_dyn_reader(r: &mut dyn Read) -> Result<Self, Error> {
        let mut text = String::new();
        r.read_to_string(&mut text)?;

        // serde_ignored wants a Deserializer, and the closest serde_yaml has is Value
        let value = value_from_str(&text)?;
        match Self::__from_value_with_warnings(value) {
            Ok(out) => Ok(out),
            // errors that pass through Value have lost their line numbers,
            // so get the error again straight from the text
            Err(_) => match Self::__from_str(&text) {
                Ok(_) => bail!("settings were readable as text but not as a yaml value"),
                Err(e) => Err(e),
            },
        }
    }

    #[doc(hidden)]
    fn __from_value_with_warnings(value: serde_yaml::Value) -> Result<Self, Error>;
    #[doc(hidden)]
    fn __from_str(s: &str) -> Result<Self, Error>;
}

#[macro_export]
macro_rules! derive_yaml_read {
    ($Type:ty) => {
        const _: () = {
            use std::result::Result;
            use std::convert::Into;
            use $crate::reexports::serde_yaml;
            use $crate::reexports::serde_ignored;
            use failure::Error;
            use log::warn;

            impl $crate::YamlRead for $Type {
                fn __from_value_with_warnings(value: serde_yaml::Value) -> Result<$Type, Error> {
                    serde_ignored::deserialize(
                        value,
                        |path| warn!("Unused setting (possible typo?): {}", path),
                    ).map_err(Into::into)
                }

                fn __from_str(s: &str) -> Result<$Type, Error> {
                    serde_yaml::from_str(s).map_err(Into::into)
                }
            }
        };
    };
}

fn value_from_str(s: &str) -> Result<serde_yaml::Value, Error>
{ serde_yaml::from_str(s).map_err(Into::into) }
