//! # Resource Base
//!
//! Per-resource orchestrator. Owns the resource's bus mailbox, gate-checks
//! every inbound command, serializes the operations that must be exclusive
//! and calls the backend driver for the actual work.
//!
//! Record writes always go through a store transaction that touches only the
//! fields the operation owns, so a status write never loses a concurrent
//! capacity credit and vice versa.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::context::OrchestratorContext;
use super::steps::{DeleteSelf, MarkPendingDelete};
use crate::cascade::{CascadeAction, CascadeContext, CascadeFlow, DeletionMode, DeletionPhase};
use crate::constants::flow_keys;
use crate::driver::{CapacityReport, DownloadResult, ResourceDriver};
use crate::error::{panic_message, OrchestrationError, OrchestrationResult};
use crate::events::CanonicalEvent;
use crate::flow::FlowChain;
use crate::logging::log_resource_operation;
use crate::messaging::{Command, CommandKind, Envelope, Message, Reply, ReplyPayload};
use crate::models::{ResourceInventory, ResourceRecord};
use crate::state_machine::{
    is_status_transition_defined, next_state, ResourceState, ResourceStatus, StateEvent,
    StateTransition, StatusTransition, ZoneChange,
};
use crate::store::{get_required, inventory_of, with_transaction};
use crate::sync::{connect_signature, resource_signature, status_signature};

/// Orchestrator for one resource instance
#[derive(Clone)]
pub struct ResourceBase {
    resource_id: Uuid,
    ctx: OrchestratorContext,
    driver: Arc<dyn ResourceDriver>,
}

impl std::fmt::Debug for ResourceBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceBase")
            .field("resource_id", &self.resource_id)
            .field("driver", &self.driver)
            .finish()
    }
}

impl ResourceBase {
    pub fn new(ctx: OrchestratorContext, resource_id: Uuid, driver: Arc<dyn ResourceDriver>) -> Self {
        Self {
            resource_id,
            ctx,
            driver,
        }
    }

    pub fn resource_id(&self) -> Uuid {
        self.resource_id
    }

    pub(crate) fn context(&self) -> &OrchestratorContext {
        &self.ctx
    }

    pub(crate) fn driver(&self) -> &Arc<dyn ResourceDriver> {
        &self.driver
    }

    /// Register the resource on the bus and start its handler loop.
    /// The loop ends once the bus directory entry is removed.
    pub fn spawn(self) -> JoinHandle<()> {
        let inbox = self.ctx.bus.register(self.resource_id);
        tokio::spawn(self.run(inbox))
    }

    async fn run(self, mut inbox: mpsc::Receiver<Envelope>) {
        debug!(resource_id = %self.resource_id, "🚀 RESOURCE: Handler loop started");
        while let Some(envelope) = inbox.recv().await {
            // Each message runs on its own task; exclusivity comes from the serializer
            let handler = self.clone();
            tokio::spawn(async move { handler.handle_envelope(envelope).await });
        }
        debug!(resource_id = %self.resource_id, "🛑 RESOURCE: Handler loop stopped");
    }

    async fn handle_envelope(&self, envelope: Envelope) {
        let Envelope { message, reply_to } = envelope;
        let message_id = message.id;
        let kind = message.kind();

        let reply = AssertUnwindSafe(self.dispatch(message))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                let panic = panic_message(payload.as_ref());
                error!(
                    resource_id = %self.resource_id,
                    message_id = %message_id,
                    command = %kind,
                    panic = %panic,
                    "💥 RESOURCE: Handler panicked"
                );
                Err(OrchestrationError::Internal(format!(
                    "handler for {kind} panicked: {panic}"
                )))
            });

        if let Err(e) = &reply {
            debug!(resource_id = %self.resource_id, command = %kind, error = %e, "Replying with error");
        }
        reply_to.complete(reply);
    }

    /// Classify, gate-check and route one message to its handler.
    ///
    /// Zone and deletion commands are gated a second time once they hold the
    /// resource signature; a state change queued ahead of them may land after
    /// this first check.
    pub async fn dispatch(&self, message: Message) -> Reply {
        let kind = message.kind();
        debug!(
            resource_id = %self.resource_id,
            message_id = %message.id,
            command = %kind,
            class = ?kind.class(),
            "📨 RESOURCE: Dispatching message"
        );
        self.check_gate(kind).await?;

        match message.command {
            Command::Connect { new_add } => self.connect(new_add).await.map(ReplyPayload::Inventory),
            Command::Reconnect => self.reconnect().await.map(ReplyPayload::Inventory),
            Command::Ping => self.ping().await.map(|_| ReplyPayload::Ack),
            Command::ChangeStatus { status } => {
                self.change_status(status).await.map(|_| ReplyPayload::Ack)
            }
            Command::ChangeState { event } => {
                self.change_state(event).await.map(ReplyPayload::Inventory)
            }
            Command::AttachToZone { zone_id } => {
                self.attach_zone(zone_id).await.map(ReplyPayload::Inventory)
            }
            Command::DetachFromZone { zone_id } => {
                self.detach_zone(zone_id).await.map(ReplyPayload::Inventory)
            }
            Command::Delete { mode } => self.delete(mode).await.map(ReplyPayload::Inventory),
            Command::ReturnCapacity { size } => {
                self.return_capacity(size).await.map(|_| ReplyPayload::Ack)
            }
            Command::Download { url, size } => {
                self.download(url, size).await.map(ReplyPayload::Download)
            }
            Command::DeleteBits { install_path, size } => self
                .delete_bits(install_path, size)
                .await
                .map(|_| ReplyPayload::Ack),
            Command::Scan => {
                self.scan().await;
                Ok(ReplyPayload::Ack)
            }
            Command::Update { name, description } => self
                .update(name, description)
                .await
                .map(ReplyPayload::Inventory),
            Command::Custom { kind, payload } => self.custom(kind, payload).await,
        }
    }

    /// Gate `kind` against the record as currently stored
    async fn check_gate(&self, kind: CommandKind) -> OrchestrationResult<()> {
        let record = self.record().await?;
        self.ctx
            .gate
            .check(self.resource_id, kind, record.state, record.status)
    }

    // ----- reads -----

    pub async fn record(&self) -> OrchestrationResult<ResourceRecord> {
        get_required(self.ctx.store.as_ref(), self.resource_id).await
    }

    pub async fn inventory(&self) -> OrchestrationResult<ResourceInventory> {
        let record = self.record().await?;
        inventory_of(self.ctx.store.as_ref(), &record).await
    }

    fn publish(&self, event: CanonicalEvent) {
        self.ctx.bus.publish(event);
    }

    // ----- status -----

    /// Idempotent status transition, serialized per resource.
    /// Returns whether the status actually changed.
    pub async fn change_status(&self, status: ResourceStatus) -> OrchestrationResult<bool> {
        let this = self.clone();
        self.ctx
            .serializer
            .submit(
                status_signature(self.resource_id),
                format!("change-status-{}-{status}", self.resource_id),
                move || async move { this.apply_status(status).await },
            )
            .await
    }

    async fn apply_status(&self, new_status: ResourceStatus) -> OrchestrationResult<bool> {
        // Status writes are serialized, so the read value is current.
        // Same-value requests are silent no-ops.
        let record = self.record().await?;
        let old_status = record.status;
        if !is_status_transition_defined(old_status, new_status) {
            debug!(resource_id = %self.resource_id, status = %new_status, "Status unchanged, no-op");
            return Ok(false);
        }

        let transition = StatusTransition {
            resource_id: self.resource_id,
            old_status,
            new_status,
        };
        let hooks = &self.ctx.hooks.status;
        hooks.pre_check(&transition).await?;
        hooks.before(&transition).await;

        let written = with_transaction(self.ctx.store.as_ref(), self.resource_id, move |r| {
            r.status = new_status;
            if new_status == ResourceStatus::Connected {
                r.last_connected_at = Some(Utc::now());
            }
            r.touch();
            Ok(())
        })
        .await;

        let record = match written {
            Ok(record) => record,
            Err(e) => {
                hooks.failed(&transition, &e).await;
                return Err(e);
            }
        };
        hooks.after(&transition).await;

        info!(
            resource_id = %self.resource_id,
            old_status = %old_status,
            new_status = %new_status,
            "🔄 RESOURCE: Status changed"
        );
        let snapshot = inventory_of(self.ctx.store.as_ref(), &record).await?;
        self.publish(CanonicalEvent::StatusChanged {
            resource_id: self.resource_id,
            old_status,
            new_status,
            snapshot,
        });
        Ok(true)
    }

    // Recovery transitions never mask the error that triggered them
    async fn change_status_best_effort(&self, status: ResourceStatus) {
        if let Err(e) = self.change_status(status).await {
            warn!(
                resource_id = %self.resource_id,
                status = %status,
                error = %e,
                "Failed to apply recovery status transition"
            );
        }
    }

    // ----- connectivity -----

    /// Run the driver connect hook under the resource's connect signature
    pub async fn connect(&self, new_add: bool) -> OrchestrationResult<ResourceInventory> {
        let this = self.clone();
        self.ctx
            .serializer
            .submit(
                connect_signature(self.resource_id),
                format!("connect-{}", self.resource_id),
                move || async move { this.do_connect(new_add).await },
            )
            .await
    }

    async fn do_connect(&self, new_add: bool) -> OrchestrationResult<ResourceInventory> {
        // A first attempt does not announce Connecting, so a failure leaves no trace
        if !new_add {
            self.change_status(ResourceStatus::Connecting).await?;
        }

        // Any failure once Connecting was announced ends Disconnected
        match self.attempt_connect(new_add).await {
            Ok(inventory) => {
                self.ctx.supervisor.track(self.resource_id);
                log_resource_operation("connect", self.resource_id, Some(&inventory.name), "connected", None);
                Ok(inventory)
            }
            Err(e) => {
                warn!(
                    resource_id = %self.resource_id,
                    new_add = new_add,
                    error = %e,
                    "🔌 RESOURCE: Connect failed"
                );
                if !new_add {
                    self.change_status_best_effort(ResourceStatus::Disconnected).await;
                }
                Err(e)
            }
        }
    }

    async fn attempt_connect(&self, new_add: bool) -> OrchestrationResult<ResourceInventory> {
        let inventory = self.inventory().await?;
        let report = AssertUnwindSafe(self.driver.connect(&inventory, new_add))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| {
                Err(OrchestrationError::backend(
                    "connect",
                    format!("driver panicked: {}", panic_message(payload.as_ref())),
                ))
            })?;

        if let Some(report) = report {
            self.update_capacity(report).await?;
        }
        self.change_status(ResourceStatus::Connected).await?;
        self.inventory().await
    }

    /// API-level reconnect; re-enters the bus as an internal connect
    pub async fn reconnect(&self) -> OrchestrationResult<ResourceInventory> {
        let reply = self
            .ctx
            .bus
            .send(self.resource_id, Command::Connect { new_add: false })
            .await;

        let outcome = reply.and_then(|payload| match payload {
            ReplyPayload::Inventory(inventory) => Ok(inventory),
            other => Err(OrchestrationError::Internal(format!(
                "unexpected connect reply: {other:?}"
            ))),
        });
        let (inventory, error) = match &outcome {
            Ok(inventory) => (Some(inventory.clone()), None),
            Err(e) => (None, Some(e.clone())),
        };
        self.publish(CanonicalEvent::Reconnected {
            resource_id: self.resource_id,
            inventory,
            error,
        });
        outcome
    }

    /// Run the driver ping hook. Success on a not-connected resource posts an
    /// internal reconnect; failure moves the status to Disconnected.
    pub async fn ping(&self) -> OrchestrationResult<()> {
        let inventory = self.inventory().await?;
        match self.driver.ping(&inventory).await {
            Ok(()) => {
                if inventory.status != ResourceStatus::Connected {
                    debug!(resource_id = %self.resource_id, status = %inventory.status, "Ping succeeded, requesting reconnect");
                    let bus = self.ctx.bus.clone();
                    let resource_id = self.resource_id;
                    tokio::spawn(async move {
                        bus.post(resource_id, Command::Connect { new_add: false })
                            .await;
                    });
                }
                Ok(())
            }
            Err(e) => {
                debug!(resource_id = %self.resource_id, error = %e, "Ping failed");
                self.change_status_best_effort(ResourceStatus::Disconnected)
                    .await;
                Err(e)
            }
        }
    }

    // ----- administrative state -----

    /// Transition the administrative state, serialized per resource
    pub async fn change_state(&self, event: StateEvent) -> OrchestrationResult<ResourceInventory> {
        let this = self.clone();
        let outcome = self
            .ctx
            .serializer
            .submit(
                resource_signature(self.resource_id),
                format!("change-state-{}-{event}", self.resource_id),
                move || async move { this.apply_state_event(event).await },
            )
            .await;

        let (old_state, new_state, inventory, error) = match &outcome {
            Ok((old, inventory)) => (Some(*old), Some(inventory.state), Some(inventory.clone()), None),
            Err(e) => (None, None, None, Some(e.clone())),
        };
        self.publish(CanonicalEvent::StateChanged {
            resource_id: self.resource_id,
            event,
            old_state,
            new_state,
            inventory,
            error,
        });
        outcome.map(|(_, inventory)| inventory)
    }

    /// Table lookup, hooks, driver hook and write. Callers must hold the
    /// resource signature. Returns the previous state and the new snapshot.
    pub(crate) async fn apply_state_event(
        &self,
        event: StateEvent,
    ) -> OrchestrationResult<(ResourceState, ResourceInventory)> {
        let inventory = self.inventory().await?;
        let old_state = inventory.state;
        let new_state = next_state(old_state, event)?;

        let transition = StateTransition {
            resource_id: self.resource_id,
            event,
            old_state,
            new_state,
        };
        let hooks = &self.ctx.hooks.state;
        hooks.pre_check(&transition).await?;
        hooks.before(&transition).await;

        let applied = match self.driver.change_state(&inventory, &transition).await {
            Ok(()) => self.write_state(new_state).await,
            Err(e) => Err(e),
        };
        if let Err(e) = applied {
            hooks.failed(&transition, &e).await;
            return Err(e);
        }
        hooks.after(&transition).await;

        log_resource_operation(
            "change_state",
            self.resource_id,
            Some(&inventory.name),
            &new_state.to_string(),
            Some(event.event_type()),
        );
        Ok((old_state, self.inventory().await?))
    }

    /// Direct state write without table lookup
    pub(crate) async fn write_state(&self, state: ResourceState) -> OrchestrationResult<ResourceRecord> {
        with_transaction(self.ctx.store.as_ref(), self.resource_id, move |r| {
            r.state = state;
            r.touch();
            Ok(())
        })
        .await
    }

    /// Put back a state and its modification time exactly as they were
    pub(crate) async fn restore_state(
        &self,
        state: ResourceState,
        updated_at: DateTime<Utc>,
    ) -> OrchestrationResult<ResourceRecord> {
        with_transaction(self.ctx.store.as_ref(), self.resource_id, move |r| {
            r.state = state;
            r.updated_at = updated_at;
            Ok(())
        })
        .await
    }

    // ----- zones -----

    pub async fn attach_zone(&self, zone_id: Uuid) -> OrchestrationResult<ResourceInventory> {
        let this = self.clone();
        let outcome = self
            .ctx
            .serializer
            .submit(
                resource_signature(self.resource_id),
                format!("attach-{}-{zone_id}", self.resource_id),
                move || async move { this.apply_zone_change(zone_id, true).await },
            )
            .await;

        let (inventory, error) = split(&outcome);
        self.publish(CanonicalEvent::ZoneAttached {
            resource_id: self.resource_id,
            zone_id,
            inventory,
            error,
        });
        outcome
    }

    pub async fn detach_zone(&self, zone_id: Uuid) -> OrchestrationResult<ResourceInventory> {
        let this = self.clone();
        let outcome = self
            .ctx
            .serializer
            .submit(
                resource_signature(self.resource_id),
                format!("detach-{}-{zone_id}", self.resource_id),
                move || async move { this.apply_zone_change(zone_id, false).await },
            )
            .await;

        let (inventory, error) = split(&outcome);
        self.publish(CanonicalEvent::ZoneDetached {
            resource_id: self.resource_id,
            zone_id,
            inventory,
            error,
        });
        outcome
    }

    async fn apply_zone_change(&self, zone_id: Uuid, attach: bool) -> OrchestrationResult<ResourceInventory> {
        self.check_gate(if attach {
            CommandKind::AttachToZone
        } else {
            CommandKind::DetachFromZone
        })
        .await?;

        let change = ZoneChange {
            resource_id: self.resource_id,
            zone_id,
        };
        let hooks = if attach {
            &self.ctx.hooks.attach
        } else {
            &self.ctx.hooks.detach
        };
        hooks.pre_check(&change).await?;
        hooks.before(&change).await;

        let inventory = self.inventory().await?;
        let store = self.ctx.store.as_ref();
        let applied = if attach {
            match self.driver.attach(&inventory, zone_id).await {
                Ok(()) => store.add_zone_ref(self.resource_id, zone_id).await.map(|_| ()),
                Err(e) => Err(e),
            }
        } else {
            match self.driver.detach(&inventory, zone_id).await {
                Ok(()) => store.remove_zone_ref(self.resource_id, zone_id).await.map(|_| ()),
                Err(e) => Err(e),
            }
        };

        if let Err(e) = applied {
            hooks.failed(&change, &e).await;
            return Err(e);
        }
        hooks.after(&change).await;

        log_resource_operation(
            if attach { "attach_zone" } else { "detach_zone" },
            self.resource_id,
            Some(&inventory.name),
            "succeeded",
            Some(&zone_id.to_string()),
        );
        self.inventory().await
    }

    // ----- deletion -----

    /// Cascading deletion through the flow pipeline for `mode`
    pub async fn delete(&self, mode: DeletionMode) -> OrchestrationResult<ResourceInventory> {
        let this = self.clone();
        self.ctx
            .serializer
            .submit(
                resource_signature(self.resource_id),
                format!("delete-{}", self.resource_id),
                move || async move { this.run_deletion(mode).await },
            )
            .await
    }

    async fn run_deletion(&self, mode: DeletionMode) -> OrchestrationResult<ResourceInventory> {
        self.check_gate(CommandKind::Delete).await?;
        let inventory = self.inventory().await?;
        let cascade_ctx = CascadeContext {
            resource_id: self.resource_id,
            resource_type: inventory.resource_type.clone(),
            mode,
            inventory: inventory.clone(),
        };
        let facade = self.ctx.cascade.clone();

        let mut chain = FlowChain::new(format!("delete-resource-{}", self.resource_id))
            .with_data(flow_keys::RESOURCE_ID, serde_json::json!(self.resource_id))
            .with_data(flow_keys::DELETION_MODE, serde_json::json!(mode));
        for phase in mode.phases() {
            chain = match phase {
                DeletionPhase::Check => chain.then(CascadeFlow::new(
                    *phase,
                    CascadeAction::DeletionCheck,
                    facade.clone(),
                    cascade_ctx.clone(),
                )),
                DeletionPhase::MarkPendingDelete => chain.then(MarkPendingDelete::new(self.clone())),
                DeletionPhase::Delete => chain.then(CascadeFlow::new(
                    *phase,
                    CascadeAction::DeletionDelete,
                    facade.clone(),
                    cascade_ctx.clone(),
                )),
                DeletionPhase::ForceDelete => chain.then(CascadeFlow::new(
                    *phase,
                    CascadeAction::DeletionForceDelete,
                    facade.clone(),
                    cascade_ctx.clone(),
                )),
                DeletionPhase::DeleteSelf => chain.then(DeleteSelf::new(self.clone())),
            };
        }

        let bus = self.ctx.bus.clone();
        let error_bus = self.ctx.bus.clone();
        let resource_id = self.resource_id;
        let deleted = inventory.clone();

        chain
            .done(move |_| async move {
                // Cleanup is advisory and never delays or fails the deletion
                tokio::spawn(async move {
                    let failures = facade
                        .async_cascade_full(CascadeAction::DeletionCleanup, &cascade_ctx)
                        .await;
                    if !failures.is_empty() {
                        warn!(resource_id = %resource_id, failures = failures.len(), "Deletion cleanup reported failures");
                    }
                });
                bus.publish(CanonicalEvent::ResourceDeleted {
                    resource_id,
                    inventory: Some(deleted),
                    error: None,
                });
            })
            .error(move |err, _| async move {
                error_bus.publish(CanonicalEvent::ResourceDeleted {
                    resource_id,
                    inventory: None,
                    error: Some(err),
                });
            })
            .start()
            .await?;

        log_resource_operation("delete", self.resource_id, Some(&inventory.name), "deleted", Some(&mode.to_string()));
        Ok(inventory)
    }

    // ----- capacity and workload -----

    /// Transactional credit, clamped to total capacity
    pub async fn return_capacity(&self, size: u64) -> OrchestrationResult<ResourceRecord> {
        with_transaction(self.ctx.store.as_ref(), self.resource_id, move |r| {
            r.credit_capacity(size);
            Ok(())
        })
        .await
    }

    /// Overwrite capacities reported by the driver
    pub async fn update_capacity(&self, report: CapacityReport) -> OrchestrationResult<ResourceRecord> {
        with_transaction(self.ctx.store.as_ref(), self.resource_id, move |r| {
            r.set_capacity(report.total, report.available)
        })
        .await
    }

    pub async fn download(&self, url: String, size: u64) -> OrchestrationResult<DownloadResult> {
        with_transaction(self.ctx.store.as_ref(), self.resource_id, move |r| {
            r.reserve_capacity(size)
        })
        .await?;

        let inventory = self.inventory().await?;
        match self.driver.download(&inventory, &url, size).await {
            Ok(result) => {
                if result.size < size {
                    self.credit_best_effort(size - result.size).await;
                }
                Ok(result)
            }
            Err(e) => {
                warn!(resource_id = %self.resource_id, url = %url, error = %e, "Download failed, releasing reservation");
                self.credit_best_effort(size).await;
                Err(e)
            }
        }
    }

    pub async fn delete_bits(&self, install_path: String, size: u64) -> OrchestrationResult<()> {
        let inventory = self.inventory().await?;
        self.driver.delete_bits(&inventory, &install_path).await?;
        self.return_capacity(size).await?;
        Ok(())
    }

    async fn credit_best_effort(&self, size: u64) {
        if let Err(e) = self.return_capacity(size).await {
            error!(resource_id = %self.resource_id, size = size, error = %e, "Failed to credit capacity back");
        }
    }

    /// Best-effort inventory scan; failures are logged and swallowed
    pub async fn scan(&self) {
        let outcome = match self.inventory().await {
            Ok(inventory) => self.driver.scan(&inventory).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            warn!(resource_id = %self.resource_id, error = %e, "Scan failed, ignoring");
        }
    }

    // ----- metadata and extensions -----

    pub async fn update(
        &self,
        name: Option<String>,
        description: Option<String>,
    ) -> OrchestrationResult<ResourceInventory> {
        let this = self.clone();
        self.ctx
            .serializer
            .submit(
                resource_signature(self.resource_id),
                format!("update-{}", self.resource_id),
                move || async move { this.apply_update(name, description).await },
            )
            .await
    }

    async fn apply_update(
        &self,
        name: Option<String>,
        description: Option<String>,
    ) -> OrchestrationResult<ResourceInventory> {
        let current = self.record().await?;
        let name = name.filter(|n| *n != current.name);
        let description = description.filter(|d| current.description.as_ref() != Some(d));
        if name.is_none() && description.is_none() {
            return inventory_of(self.ctx.store.as_ref(), &current).await;
        }

        let record = with_transaction(self.ctx.store.as_ref(), self.resource_id, move |r| {
            if let Some(name) = name {
                r.name = name;
            }
            if let Some(description) = description {
                r.description = Some(description);
            }
            r.touch();
            Ok(())
        })
        .await?;

        let inventory = inventory_of(self.ctx.store.as_ref(), &record).await?;
        self.publish(CanonicalEvent::ResourceUpdated {
            resource_id: self.resource_id,
            inventory: inventory.clone(),
        });
        Ok(inventory)
    }

    async fn custom(&self, kind: String, payload: serde_json::Value) -> Reply {
        let inventory = self.inventory().await?;
        match self.driver.handle_custom(&inventory, &kind, &payload).await {
            Some(result) => result.map(ReplyPayload::Custom),
            None => Err(OrchestrationError::UnhandledMessage { kind }),
        }
    }
}

fn split(
    outcome: &OrchestrationResult<ResourceInventory>,
) -> (Option<ResourceInventory>, Option<OrchestrationError>) {
    match outcome {
        Ok(inventory) => (Some(inventory.clone()), None),
        Err(e) => (None, Some(e.clone())),
    }
}
