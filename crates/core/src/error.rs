use thiserror::Error;

use crate::model::{ClientSettingsError, ParseIdError, ParseStatusError, ValidationError};
use crate::screen::ScreenError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Screen(#[from] ScreenError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
    #[error(transparent)]
    ParseStatus(#[from] ParseStatusError),
    #[error(transparent)]
    Settings(#[from] ClientSettingsError),
}
