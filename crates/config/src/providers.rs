use figment::{
    Error, Metadata, Profile, Provider,
    providers::{Env, Format, Toml},
    value::{Dict, Map, Value},
};
use std::path::{Path, PathBuf};

/// Reads `tally.toml`, or the file named by `env_var` when that is set.
///
/// A file named by the env var must exist. The default file may be absent.
pub(crate) struct TomlFileProvider {
    pub env_var: Option<&'static str>,
    pub default: PathBuf,
}

impl TomlFileProvider {
    pub(crate) fn new(env_var: Option<&'static str>, default: impl Into<PathBuf>) -> Self {
        Self { env_var, default: default.into() }
    }

    fn env_val(&self) -> Option<String> {
        self.env_var.and_then(Env::var)
    }

    fn file(&self) -> PathBuf {
        self.env_val().map(PathBuf::from).unwrap_or_else(|| self.default.clone())
    }

    fn is_missing(&self) -> bool {
        self.env_val().is_some_and(|file| !Path::new(&file).exists())
    }
}

impl Provider for TomlFileProvider {
    fn metadata(&self) -> Metadata {
        if self.is_missing() {
            Metadata::named("tally.toml")
        } else {
            Toml::file(self.file()).nested().metadata()
        }
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        if self.is_missing() {
            return Err(format!(
                "config file `{}` named by `{}` not found",
                self.file().display(),
                self.env_var.unwrap_or_default()
            )
            .into());
        }
        Toml::file(self.file()).nested().data()
    }
}

/// Lifts `[profile.<name>]` tables to figment profiles.
pub(crate) struct UnwrapProfileProvider<P> {
    provider: P,
    wrapping_key: Profile,
}

impl<P> UnwrapProfileProvider<P> {
    pub(crate) fn new(provider: P, wrapping_key: impl Into<Profile>) -> Self {
        Self { provider, wrapping_key: wrapping_key.into() }
    }
}

impl<P: Provider> Provider for UnwrapProfileProvider<P> {
    fn metadata(&self) -> Metadata {
        self.provider.metadata()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut data = self.provider.data()?;
        let mut unwrapped = Map::new();
        let Some(profiles) = data.remove(&self.wrapping_key) else {
            return Ok(unwrapped);
        };
        for (profile_str, profile_val) in profiles {
            let profile = Profile::new(&profile_str);
            match profile_val {
                Value::Dict(_, dict) => {
                    unwrapped.insert(profile, dict);
                }
                bad_val => {
                    let mut err = Error::from(figment::error::Kind::InvalidType(
                        bad_val.to_actual(),
                        "dict".into(),
                    ));
                    err.metadata = Some(self.provider.metadata());
                    err.profile = Some(profile);
                    return Err(err);
                }
            }
        }
        Ok(unwrapped)
    }
}
