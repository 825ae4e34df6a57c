//! Shared test doubles for the Storyloom adventure generator.

mod gateway;
mod presenter;

pub use gateway::{FailingGateway, GatedGateway, ScriptedGateway};
pub use presenter::{PresenterEvent, RecordingPresenter};
