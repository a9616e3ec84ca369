//! This mod holds the CMG's client-facing API.
mod cmg_service;
mod error;
mod options;
mod topology_service;
mod watchdog;
mod wiring;

pub use cmg_service::CmgRaftService;
pub use cmg_service::CURRENT_VERSION;
pub use error::CmgError;
pub use options::CmgOptions;
pub use topology_service::StaticTopologyService;
pub use topology_service::TopologyService;
pub use watchdog::ValidationWatchdog;
pub use wiring::try_create_cmg_service;
pub use wiring::CmgServiceConfig;
pub use wiring::CmgServiceCreationError;
