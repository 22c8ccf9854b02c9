//! Ordered model lifecycle callbacks.
//!
//! Repositories own a [`Lifecycle`] per model type and fire it around every
//! persistence step:
//!
//! ```text
//! create:  saving -> creating -> (insert) -> created -> saved
//! update:  saving -> updating -> (update) -> updated -> saved
//! delete:  deleting -> (soft delete) -> deleted
//! restore: restoring -> (restore) -> restored
//! ```
//!
//! Hooks registered for the same event run in registration order. A hook
//! returning an error aborts the operation before anything is written.

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::audit::Auditable;
use crate::context::RequestContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Creating,
    Created,
    Updating,
    Updated,
    Saving,
    Saved,
    Deleting,
    Deleted,
    Restoring,
    Restored,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Creating => "creating",
            Self::Created => "created",
            Self::Updating => "updating",
            Self::Updated => "updated",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Deleting => "deleting",
            Self::Deleted => "deleted",
            Self::Restoring => "restoring",
            Self::Restored => "restored",
        };
        f.write_str(name)
    }
}

/// Kind of write a save represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOp {
    Create,
    Update,
}

#[derive(Debug, Error)]
#[error("{event} hook rejected the operation: {reason}")]
pub struct LifecycleError {
    pub event: LifecycleEvent,
    pub reason: String,
}

impl LifecycleError {
    pub fn new(event: LifecycleEvent, reason: impl Into<String>) -> Self {
        Self {
            event,
            reason: reason.into(),
        }
    }
}

/// Callback attached to one or more lifecycle events
pub trait LifecycleHook<M>: Send + Sync {
    fn handle(
        &self,
        event: LifecycleEvent,
        model: &mut M,
        ctx: &RequestContext,
    ) -> Result<(), LifecycleError>;
}

impl<M, F> LifecycleHook<M> for F
where
    F: Fn(LifecycleEvent, &mut M, &RequestContext) -> Result<(), LifecycleError> + Send + Sync,
{
    fn handle(
        &self,
        event: LifecycleEvent,
        model: &mut M,
        ctx: &RequestContext,
    ) -> Result<(), LifecycleError> {
        self(event, model, ctx)
    }
}

/// Registry of hooks for one model type
pub struct Lifecycle<M> {
    hooks: Vec<(LifecycleEvent, Arc<dyn LifecycleHook<M>>)>,
}

impl<M> Clone for Lifecycle<M> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
        }
    }
}

impl<M> Default for Lifecycle<M> {
    fn default() -> Self {
        Self { hooks: Vec::new() }
    }
}

impl<M> fmt::Debug for Lifecycle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field(
                "hooks",
                &self.hooks.iter().map(|(event, _)| *event).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<M: Auditable + 'static> Lifecycle<M> {
    /// Registry with audit stamping on create and update
    pub fn audited() -> Self {
        Self::default()
            .on(LifecycleEvent::Creating, AuditStamp)
            .on(LifecycleEvent::Updating, AuditStamp)
    }
}

impl<M> Lifecycle<M> {
    pub fn on(mut self, event: LifecycleEvent, hook: impl LifecycleHook<M> + 'static) -> Self {
        self.hooks.push((event, Arc::new(hook)));
        self
    }

    pub fn fire(
        &self,
        event: LifecycleEvent,
        model: &mut M,
        ctx: &RequestContext,
    ) -> Result<(), LifecycleError> {
        for (registered, hook) in &self.hooks {
            if *registered == event {
                hook.handle(event, model, ctx)?;
            }
        }
        Ok(())
    }

    /// `saving` then `creating`/`updating`
    pub fn before_save(
        &self,
        op: SaveOp,
        model: &mut M,
        ctx: &RequestContext,
    ) -> Result<(), LifecycleError> {
        self.fire(LifecycleEvent::Saving, model, ctx)?;
        match op {
            SaveOp::Create => self.fire(LifecycleEvent::Creating, model, ctx),
            SaveOp::Update => self.fire(LifecycleEvent::Updating, model, ctx),
        }
    }

    /// `created`/`updated` then `saved`
    pub fn after_save(
        &self,
        op: SaveOp,
        model: &mut M,
        ctx: &RequestContext,
    ) -> Result<(), LifecycleError> {
        match op {
            SaveOp::Create => self.fire(LifecycleEvent::Created, model, ctx)?,
            SaveOp::Update => self.fire(LifecycleEvent::Updated, model, ctx)?,
        }
        self.fire(LifecycleEvent::Saved, model, ctx)
    }
}

/// Stamps audit columns from the request context.
///
/// Registered on `creating` and `updating`; any other event is a no-op.
pub struct AuditStamp;

impl<M: Auditable> LifecycleHook<M> for AuditStamp {
    fn handle(
        &self,
        event: LifecycleEvent,
        model: &mut M,
        ctx: &RequestContext,
    ) -> Result<(), LifecycleError> {
        let op = match event {
            LifecycleEvent::Creating => SaveOp::Create,
            LifecycleEvent::Updating => SaveOp::Update,
            _ => return Ok(()),
        };
        model.audit_mut().stamp(ctx, op);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditFields;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Widget {
        audit: AuditFields,
        trail: Vec<String>,
    }

    impl Auditable for Widget {
        fn audit(&self) -> &AuditFields {
            &self.audit
        }
        fn audit_mut(&mut self) -> &mut AuditFields {
            &mut self.audit
        }
    }

    fn recorder(label: &'static str) -> impl LifecycleHook<Widget> {
        move |event: LifecycleEvent, w: &mut Widget, _: &RequestContext| -> Result<(), LifecycleError> {
            w.trail.push(format!("{}:{}", label, event));
            Ok(())
        }
    }

    #[test]
    fn create_fires_events_in_documented_order() {
        let lifecycle = Lifecycle::default()
            .on(LifecycleEvent::Saved, recorder("a"))
            .on(LifecycleEvent::Creating, recorder("a"))
            .on(LifecycleEvent::Saving, recorder("a"))
            .on(LifecycleEvent::Created, recorder("a"));
        let ctx = RequestContext::system();
        let mut widget = Widget::default();

        lifecycle
            .before_save(SaveOp::Create, &mut widget, &ctx)
            .unwrap();
        widget.trail.push("insert".to_string());
        lifecycle.after_save(SaveOp::Create, &mut widget, &ctx).unwrap();

        assert_eq!(
            widget.trail,
            vec!["a:saving", "a:creating", "insert", "a:created", "a:saved"]
        );
    }

    #[test]
    fn hooks_for_one_event_run_in_registration_order() {
        let lifecycle = Lifecycle::default()
            .on(LifecycleEvent::Updating, recorder("first"))
            .on(LifecycleEvent::Updating, recorder("second"));
        let mut widget = Widget::default();

        lifecycle
            .fire(LifecycleEvent::Updating, &mut widget, &RequestContext::system())
            .unwrap();

        assert_eq!(widget.trail, vec!["first:updating", "second:updating"]);
    }

    #[test]
    fn failing_hook_stops_the_chain() {
        let calls = Arc::new(Mutex::new(0));
        let counted = calls.clone();
        let lifecycle = Lifecycle::default()
            .on(
                LifecycleEvent::Deleting,
                |event: LifecycleEvent, _: &mut Widget, _: &RequestContext| -> Result<(), LifecycleError> {
                    Err(LifecycleError::new(event, "locked"))
                },
            )
            .on(
                LifecycleEvent::Deleting,
                move |_: LifecycleEvent, _: &mut Widget, _: &RequestContext| -> Result<(), LifecycleError> {
                    *counted.lock().unwrap() += 1;
                    Ok(())
                },
            );

        let err = lifecycle
            .fire(LifecycleEvent::Deleting, &mut Widget::default(), &RequestContext::system())
            .unwrap_err();

        assert_eq!(err.event, LifecycleEvent::Deleting);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn audited_lifecycle_stamps_per_operation() {
        let lifecycle = Lifecycle::<Widget>::audited();
        let ctx = RequestContext::default().with_user(4).with_ip("127.0.0.1");
        let mut widget = Widget::default();

        lifecycle.before_save(SaveOp::Create, &mut widget, &ctx).unwrap();
        assert_eq!(widget.audit.created_by, Some(4));

        let later = RequestContext::default().with_user(8);
        lifecycle.before_save(SaveOp::Update, &mut widget, &later).unwrap();
        assert_eq!(widget.audit.created_by, Some(4));
        assert_eq!(widget.audit.updated_by, Some(8));
    }
}
