//! Allocation domain models.
//!
//! Provides the data types for describing a multi-robot task allocation
//! problem and its solution.
//!
//! # Domain Mappings
//!
//! | u-mrta | Warehouse | Inspection | Disaster Response |
//! |--------|-----------|------------|-------------------|
//! | Task | Pick/Drop | Inspection Point | Search Sector |
//! | Robot | AGV | Drone | UGV Team Member |
//! | Timeline | Route | Flight Plan | Sortie Plan |
//! | Schedule | Fleet Plan | Mission Plan | Operation Plan |

mod precondition;
mod robot;
mod schedule;
mod task;
mod timeline;

pub use precondition::{earliest_start_of, Precondition, Preconditions};
pub use robot::{Robot, WorkerId};
pub use schedule::{Assignment, Schedule, Violation, ViolationType};
pub use task::{Location, Task, TaskId};
pub use timeline::{Evaluation, Timeline};
