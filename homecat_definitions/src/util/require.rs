use crate::{ErrorKind, Result};

pub trait Require<T> {
    /// Unwrap a field that must be set by the time a workload is assembled
    fn require(self, workload: &str, field: &str) -> Result<T>;
}

impl<T> Require<T> for Option<T> {
    fn require(self, workload: &str, field: &str) -> Result<T> {
        match self {
            Some(t) => Ok(t),
            None => bail!(ErrorKind::MissingField(workload.into(), field.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Require;
    use crate::ErrorKind;

    #[test]
    fn require() {
        assert_eq!(Some(8989).require("sonarr", "port").unwrap(), 8989);

        let err = None::<u16>.require("valheim", "image").unwrap_err();
        match err.kind() {
            ErrorKind::MissingField(w, f) => {
                assert_eq!(w, "valheim");
                assert_eq!(f, "image");
            }
            k => panic!("unexpected error kind {:?}", k),
        }
        assert!(err.is_configuration());
    }
}
