use cmg::{
    ClusterNode, ClusterState, ClusterTag, CmgError, CmgOptions, CmgRaftService, CmgServiceConfig, CmgStateMachine,
    LocalRaftGroup, NodeAddress, StaticTopologyService,
};
use slog::Drain;
use std::error::Error;
use std::sync::Arc;

// Boots a three node cluster on an in-process CMG: node-1 hosts the only CMG voting peer and
// initializes the cluster, then every node (node-1 included) joins the logical topology.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let logger = create_root_logger_for_stdout();

    let (state_machine, mut topology_events) = CmgStateMachine::new(logger.new(slog::o!("replica" => "node-1")));
    let group = LocalRaftGroup::start(logger.clone(), vec![("node-1".to_string(), state_machine)])?;
    group.elect("node-1").await?;

    let nodes: Vec<ClusterNode> = (1..=3)
        .map(|i| {
            ClusterNode::new(
                format!("id-{}", i),
                format!("node-{}", i),
                NodeAddress::new("127.0.0.1", 3343 + i as u16),
            )
        })
        .collect();

    let mut services = Vec::with_capacity(nodes.len());
    for node in nodes.iter() {
        let service = cmg::try_create_cmg_service(CmgServiceConfig {
            logger: logger.clone(),
            raft: Arc::new(group.service_for(node.name.clone())),
            topology: Arc::new(StaticTopologyService::new(node.clone())),
            options: CmgOptions::default(),
        })?;
        services.push(Arc::new(service));
    }

    let initializer = &services[0];
    let cluster_state = initial_cluster_state(initializer)?;
    let tag = initializer.init_cluster_state(cluster_state).await?.cluster_tag;
    let _watchdog = initializer.start_validation_watchdog();

    for service in services.iter() {
        service.start_join_cluster(&tag).await?;
        service.complete_join_cluster().await?;
    }

    for node in initializer.logical_topology().await? {
        slog::info!(logger, "Member: {}", node);
    }
    while let Some(event) = topology_events.try_next_event() {
        slog::info!(logger, "Topology event: {:?}", event);
    }

    Ok(())
}

fn initial_cluster_state(service: &CmgRaftService) -> Result<ClusterState, CmgError> {
    let cmg_nodes = service.node_names()?;

    Ok(ClusterState {
        metastorage_nodes: cmg_nodes.clone(),
        cmg_nodes,
        version: service.product_version().to_string(),
        cluster_tag: ClusterTag::random("demo-cluster"),
    })
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
