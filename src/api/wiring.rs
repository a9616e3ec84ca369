use crate::api::cmg_service::CmgRaftService;
use crate::api::options::CmgOptionsValidated;
use crate::api::{CmgOptions, TopologyService};
use crate::raft::RaftGroupService;
use std::convert::TryFrom;
use std::sync::Arc;

pub struct CmgServiceConfig {
    pub logger: slog::Logger,
    /// This node's session to the CMG raft group.
    pub raft: Arc<dyn RaftGroupService>,
    pub topology: Arc<dyn TopologyService>,
    pub options: CmgOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum CmgServiceCreationError {
    #[error("Illegal options for configuring CMG service: {0}")]
    IllegalOptions(String),
}

pub fn try_create_cmg_service(config: CmgServiceConfig) -> Result<CmgRaftService, CmgServiceCreationError> {
    let options = CmgOptionsValidated::try_from(config.options)
        .map_err(|e| CmgServiceCreationError::IllegalOptions(e.to_string()))?;

    let local_name = config.topology.local_member().name;
    let logger = config.logger.new(slog::o!("node" => local_name));

    Ok(CmgRaftService::new(logger, config.raft, config.topology, options))
}
