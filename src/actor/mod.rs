//! The local raft group's event loop in actor model. A single task owns the commit log and every
//! replica's state machine, so entries are applied strictly one at a time in commit order.
use crate::commitlog::{InMemoryLog, Index, Log};
use crate::raft::{GroupLogEntry, LocalRaftGroupError, Peer, SubmitError};
use crate::state_machine::{LocalStateMachineApplier, StateMachineOutput};
use bytes::Bytes;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

pub(crate) fn create<M>(
    logger: slog::Logger,
    buffer_size: usize,
    replicas: Vec<(Peer, M)>,
    log: InMemoryLog<GroupLogEntry>,
) -> (ActorClient, GroupActor<M>)
where
    M: LocalStateMachineApplier,
{
    let (tx, rx) = mpsc::channel(buffer_size);
    let client = ActorClient { sender: tx };
    let actor = GroupActor {
        logger,
        receiver: rx,
        replicas: replicas
            .into_iter()
            .map(|(peer, state_machine)| Replica { peer, state_machine })
            .collect(),
        log,
        term: 0,
        leader: None,
        disconnected: HashSet::new(),
    };

    (client, actor)
}

#[derive(Debug)]
enum Event {
    // Leader known and origin connected: append, apply on every replica, reply with leader's output.
    // Otherwise: reject.
    Submit {
        origin: String,
        data: Bytes,
        callback: Callback<StateMachineOutput, SubmitError>,
    },
    CurrentLeader(Callback<Option<Peer>, SubmitError>),
    Elect(String, Callback<u64, LocalRaftGroupError>),
    StepDown(Callback<(), LocalRaftGroupError>),
    SetConnected(String, bool, Callback<(), LocalRaftGroupError>),
}

#[derive(Debug)]
struct Callback<O: Debug, E: Error>(oneshot::Sender<Result<O, E>>);

impl<O: Debug, E: Error> Callback<O, E> {
    fn send(self, message: Result<O, E>) {
        let _ = self.0.send(message);
    }
}

#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) async fn submit(&self, origin: String, data: Bytes) -> Result<StateMachineOutput, SubmitError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Submit {
            origin,
            data,
            callback: Callback(tx),
        })
        .await
        .map_err(|_| SubmitError::GroupExited)?;

        rx.await.map_err(|_| SubmitError::GroupExited)?
    }

    pub(crate) async fn current_leader(&self) -> Result<Option<Peer>, SubmitError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::CurrentLeader(Callback(tx)))
            .await
            .map_err(|_| SubmitError::GroupExited)?;

        rx.await.map_err(|_| SubmitError::GroupExited)?
    }

    pub(crate) async fn elect(&self, name: String) -> Result<u64, LocalRaftGroupError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Elect(name, Callback(tx)))
            .await
            .map_err(|_| LocalRaftGroupError::GroupExited)?;

        rx.await.map_err(|_| LocalRaftGroupError::GroupExited)?
    }

    pub(crate) async fn step_down(&self) -> Result<(), LocalRaftGroupError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::StepDown(Callback(tx)))
            .await
            .map_err(|_| LocalRaftGroupError::GroupExited)?;

        rx.await.map_err(|_| LocalRaftGroupError::GroupExited)?
    }

    pub(crate) async fn set_connected(&self, name: String, connected: bool) -> Result<(), LocalRaftGroupError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::SetConnected(name, connected, Callback(tx)))
            .await
            .map_err(|_| LocalRaftGroupError::GroupExited)?;

        rx.await.map_err(|_| LocalRaftGroupError::GroupExited)?
    }

    async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.sender.send(event).await
    }
}

struct Replica<M> {
    peer: Peer,
    state_machine: M,
}

/// GroupActor is the local raft group logic in actor model.
pub(crate) struct GroupActor<M> {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    replicas: Vec<Replica<M>>,
    log: InMemoryLog<GroupLogEntry>,
    // Incremented on every election.
    term: u64,
    leader: Option<Peer>,
    // Nodes whose client sessions can't reach the group.
    disconnected: HashSet<String>,
}

impl<M> GroupActor<M>
where
    M: LocalStateMachineApplier,
{
    pub(crate) async fn run_event_loop(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }

        slog::info!(self.logger, "Raft group event loop exited.");
    }

    // This must NOT be async. Entries are applied synchronously, in order, before the next event
    // is looked at.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Submit { origin, data, callback } => {
                let result = self.handle_submit(&origin, data);
                callback.send(result);
            }
            Event::CurrentLeader(callback) => {
                callback.send(Ok(self.leader.clone()));
            }
            Event::Elect(name, callback) => {
                let result = self.handle_elect(name);
                callback.send(result);
            }
            Event::StepDown(callback) => {
                slog::info!(self.logger, "Leader {:?} stepped down in term {}.", self.leader, self.term);
                self.leader = None;
                callback.send(Ok(()));
            }
            Event::SetConnected(name, connected, callback) => {
                let result = self.handle_set_connected(name, connected);
                callback.send(result);
            }
        }
    }

    fn handle_submit(&mut self, origin: &str, data: Bytes) -> Result<StateMachineOutput, SubmitError> {
        if self.disconnected.contains(origin) {
            return Err(SubmitError::Disconnected(origin.to_string()));
        }

        let leader = match &self.leader {
            Some(leader) if !self.disconnected.contains(leader.consistent_id()) => leader.clone(),
            _ => return Err(SubmitError::NoLeader),
        };

        let index = self
            .log
            .append(GroupLogEntry { term: self.term, data })
            .map_err(SubmitError::LocalIoError)?;

        self.apply_committed(index, &leader)
    }

    // Everything appended is committed right away: replication is out of scope here, ordering is
    // what matters to the state machine. The entry is read back so replicas apply exactly what the
    // log stored.
    fn apply_committed(&mut self, index: Index, leader: &Peer) -> Result<StateMachineOutput, SubmitError> {
        let entry = match self.log.read(index).map_err(SubmitError::LocalIoError)? {
            Some(entry) => entry,
            None => {
                return Err(SubmitError::LocalIoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Entry {:?} missing right after append", index),
                )))
            }
        };

        slog::debug!(self.logger, "Applying entry {:?} of term {}", index, entry.term);

        let mut leader_output = None;
        let mut outputs = Vec::with_capacity(self.replicas.len());
        for replica in self.replicas.iter_mut() {
            let output = replica.state_machine.apply_committed_entry(entry.data.clone());
            if &replica.peer == leader {
                leader_output = Some(output.clone());
            }
            outputs.push(output);
        }

        debug_assert!(
            outputs.windows(2).all(|pair| pair[0] == pair[1]),
            "Replicas diverged applying entry {:?}",
            index
        );

        // The leader is always one of the replicas, `handle_elect` makes sure of it.
        Ok(leader_output.unwrap_or(StateMachineOutput::NoData))
    }

    fn handle_elect(&mut self, name: String) -> Result<u64, LocalRaftGroupError> {
        let peer = self
            .replicas
            .iter()
            .map(|replica| &replica.peer)
            .find(|peer| peer.consistent_id() == name)
            .cloned()
            .ok_or(LocalRaftGroupError::UnknownPeer(name))?;

        self.term += 1;
        slog::info!(self.logger, "{} elected leader for term {}.", peer, self.term);
        self.leader = Some(peer);

        Ok(self.term)
    }

    fn handle_set_connected(&mut self, name: String, connected: bool) -> Result<(), LocalRaftGroupError> {
        if connected {
            self.disconnected.remove(&name);
        } else {
            slog::info!(self.logger, "{} disconnected from the raft group.", name);
            self.disconnected.insert(name);
        }

        Ok(())
    }
}
