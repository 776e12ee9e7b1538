//! Typed sentinels for environment variables.
//!
//! [env_var] declares a struct whose existence proves the matching `SCREAMING_SNAKE_CASE`
//! variable was present when it was read.

// Re-export paste so users don't need to depend on it directly
pub use paste;
use std::env::VarError;
use thiserror::Error;


#[cfg(any(test, feature = "mock"))]
mod testing_harness {
    use super::VarNameErr;
    use std::cell::Cell;

    type MockValue = Cell<Option<Box<dyn Fn(&'static str) -> Result<String, std::env::VarError>>>>;
    thread_local! {
        static MOCK_VAR_GETTER: MockValue = const { Cell::new(None) };
    }

    /// read a variable, consulting the thread local override first
    pub fn read_env(s: &'static str) -> Result<String, VarNameErr> {
        let cur_getter = MOCK_VAR_GETTER.replace(None);
        match cur_getter {
            Some(mock) => {
                let out = mock(s);
                MOCK_VAR_GETTER.replace(Some(mock));
                out
            }
            None => std::env::var(s),
        }
        .map_err(|err| VarNameErr { var_name: s, err })
    }

    /// run `cb` with every env read on this thread answered by `f`
    pub fn with_mock_env<F, Cb, U>(f: F, cb: Cb) -> U
    where
        F: Fn(&'static str) -> Result<String, std::env::VarError> + 'static,
        Cb: FnOnce() -> U,
    {
        MOCK_VAR_GETTER.replace(Some(Box::new(f)));
        let output = cb();
        MOCK_VAR_GETTER.replace(None);
        output
    }
}

#[cfg(any(test, feature = "mock"))]
pub use testing_harness::{read_env, with_mock_env};

/// read a variable from the process environment
#[cfg(not(any(test, feature = "mock")))]
pub fn read_env(s: &'static str) -> Result<String, VarNameErr> {
    std::env::var(s).map_err(|err| VarNameErr { var_name: s, err })
}

/// The type of error that is produced by this crate
#[derive(Debug, Error)]
#[error("An error occurred while reading envvar: {var_name}. Err: {err}")]
pub struct VarNameErr {
    var_name: &'static str,
    err: VarError,
}

impl VarNameErr {
    /// the name of the variable that could not be read
    pub fn var_name(&self) -> &'static str {
        self.var_name
    }

    /// true if the variable was absent rather than malformed
    pub fn is_missing(&self) -> bool {
        matches!(self.err, VarError::NotPresent)
    }
}

#[macro_export]
macro_rules! env_var {
    (
        $(#[$attr:meta])*
        $v:vis struct $n:ident;
    ) => {
        $crate::paste::paste! {
            #[doc = "Sentinel for the `" $n:snake:upper "` environment variable."]
            $(#[$attr])*
            $v struct $n(std::sync::Arc<str>);

            impl $n {
                /// the name of the variable this sentinel reads
                #[allow(dead_code)]
                $v const NAME: &'static str = stringify!([<$n:snake:upper>]);

                #[doc = "Read `" $n:snake:upper "` from the environment, failing if it is unset or not unicode."]
                #[allow(dead_code)]
                #[tracing::instrument(err, level = tracing::Level::TRACE)]
                $v fn new() -> Result<Self, $crate::VarNameErr> {
                    let res = $crate::read_env(Self::NAME)?;
                    Ok(Self(std::sync::Arc::from(res)))
                }

                #[doc = "Read `" $n:snake:upper "` from the environment, returning [None] if it is unset."]
                #[allow(dead_code)]
                $v fn new_optional() -> Result<Option<Self>, $crate::VarNameErr> {
                    match Self::new() {
                        Ok(v) => Ok(Some(v)),
                        Err(e) if e.is_missing() => Ok(None),
                        Err(e) => Err(e),
                    }
                }

                /// construct the sentinel from a known value
                #[allow(dead_code)]
                $v fn from_value(s: impl Into<std::sync::Arc<str>>) -> Self {
                    Self(s.into())
                }

                /// returns an Arc<str> of the contained value
                #[allow(dead_code)]
                $v fn as_arc(&self) -> std::sync::Arc<str> {
                    self.0.clone()
                }
            }

            impl std::ops::Deref for $n {
                type Target = str;

                fn deref(&self) -> &Self::Target {
                    &self.0
                }
            }

            impl std::convert::AsRef<str> for $n {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }
        }
    };
    (
        $(#[$attr:meta])*
        $v:vis struct $n:ident {
            $(
                $(#[$field_attr:meta])*
                $field_vis:vis $field_name:ident
            ),* $(,)?
        }
    ) => {
        $crate::paste::paste! {
            $(
                $crate::env_var!(
                    $(#[$field_attr])*
                    $field_vis struct $field_name;
                );
            )*

            $(#[$attr])*
            $v struct $n {
                $(
                    pub [<$field_name:snake>]: $field_name,
                )*
            }

            impl $n {
                /// Read every member variable, failing on the first one that cannot be found
                #[allow(dead_code)]
                $v fn new() -> Result<Self, $crate::VarNameErr> {
                    Ok(Self {
                        $(
                            [<$field_name:snake>]: $field_name::new()?,
                        )*
                    })
                }
            }
        }
    };
}
