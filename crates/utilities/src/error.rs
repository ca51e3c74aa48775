use core::error::Error;
use core::fmt::Debug;
use core::fmt::Display;

/// The catch-all error type of the workspace. Anything implementing [`Error`]
/// converts into it, so it can be returned from functions that combine I/O,
/// parsing and validation failures. A backtrace is captured at conversion.
///
/// Note that the term store itself never returns errors: misuse of the store
/// is a fatal defect and panics. This type is only used at the boundaries,
/// such as loading a configuration file.
pub struct RcTermError {
    inner: Box<InnerRcTermError>,
}

impl RcTermError {
    /// Attempts to downcast the underlying error to the given type.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.error.downcast_ref::<E>()
    }
}

/// Boxed separately to keep `Result<T, RcTermError>` a single pointer wide.
struct InnerRcTermError {
    error: Box<dyn Error + Send + Sync + 'static>,
    backtrace: std::backtrace::Backtrace,
}

// Written as a blanket impl over `Box<dyn Error>: From<E>` so that `&str` and `String` convert as well.
impl<E> From<E> for RcTermError
where
    Box<dyn Error + Send + Sync + 'static>: From<E>,
{
    #[cold]
    fn from(error: E) -> Self {
        RcTermError {
            inner: Box::new(InnerRcTermError {
                error: error.into(),
                backtrace: std::backtrace::Backtrace::capture(),
            }),
        }
    }
}

impl Display for RcTermError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.inner.error)
    }
}

impl Debug for RcTermError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self.inner.error)?;

        let backtrace = &self.inner.backtrace;
        if let std::backtrace::BacktraceStatus::Captured = backtrace.status() {
            writeln!(f, "{backtrace}")?;
        }

        Ok(())
    }
}
