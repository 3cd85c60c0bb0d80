use thiserror::Error;

use crate::model::{TrainingId, UserId};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScreenError {
    #[error("a record is already open")]
    AlreadyOpen,
    #[error("no record is open")]
    NotOpen,
}

/// What the detail pane is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editing<Id> {
    New,
    Existing(Id),
}

/// Admin master/detail navigation: the list, or one record open for editing.
///
/// The trainings screen calls the open state "detail", the users screen
/// calls it "form"; the transitions are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MasterDetail<Id> {
    #[default]
    List,
    Detail(Editing<Id>),
}

pub type TrainingScreen = MasterDetail<TrainingId>;
pub type UserScreen = MasterDetail<UserId>;

impl<Id: Copy> MasterDetail<Id> {
    /// # Errors
    ///
    /// Returns `ScreenError::AlreadyOpen` unless the list is showing.
    pub fn open_new(&mut self) -> Result<(), ScreenError> {
        self.open(Editing::New)
    }

    /// # Errors
    ///
    /// Returns `ScreenError::AlreadyOpen` unless the list is showing.
    pub fn open_edit(&mut self, id: Id) -> Result<(), ScreenError> {
        self.open(Editing::Existing(id))
    }

    fn open(&mut self, editing: Editing<Id>) -> Result<(), ScreenError> {
        match self {
            Self::List => {
                *self = Self::Detail(editing);
                Ok(())
            }
            Self::Detail(_) => Err(ScreenError::AlreadyOpen),
        }
    }

    /// Leave the detail after a successful save; returns what was edited.
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::NotOpen` from the list.
    pub fn save(&mut self) -> Result<Editing<Id>, ScreenError> {
        self.close()
    }

    /// # Errors
    ///
    /// Returns `ScreenError::NotOpen` from the list.
    pub fn cancel(&mut self) -> Result<Editing<Id>, ScreenError> {
        self.close()
    }

    fn close(&mut self) -> Result<Editing<Id>, ScreenError> {
        match *self {
            Self::Detail(editing) => {
                *self = Self::List;
                Ok(editing)
            }
            Self::List => Err(ScreenError::NotOpen),
        }
    }

    #[must_use]
    pub fn editing(&self) -> Option<Editing<Id>> {
        match self {
            Self::Detail(editing) => Some(*editing),
            Self::List => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_to_detail_and_back() {
        let mut screen = TrainingScreen::default();
        screen.open_edit(TrainingId::new(3)).unwrap();
        assert_eq!(screen.editing(), Some(Editing::Existing(TrainingId::new(3))));

        let edited = screen.save().unwrap();
        assert_eq!(edited, Editing::Existing(TrainingId::new(3)));
        assert_eq!(screen, MasterDetail::List);
    }

    #[test]
    fn rejects_invalid_transitions() {
        let mut screen = UserScreen::default();
        assert_eq!(screen.cancel(), Err(ScreenError::NotOpen));

        screen.open_new().unwrap();
        assert_eq!(screen.open_edit(UserId::new(1)), Err(ScreenError::AlreadyOpen));
        assert_eq!(screen.cancel(), Ok(Editing::New));
        assert_eq!(screen.editing(), None);
    }
}
