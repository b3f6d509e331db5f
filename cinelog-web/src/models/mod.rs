//! Data models for cinelog-web

pub mod batch;
pub mod notice;

pub use batch::{
    BatchSession, BatchState, ConfirmationEntry, PendingConfirmationSet, PendingQueue, Selection,
    SelectionAccumulator, UserInput,
};
pub use notice::{Notice, NoticeLevel};
