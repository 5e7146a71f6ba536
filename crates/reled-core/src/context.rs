//! Collaborators shared by the records of one editing session.

use std::fmt;
use std::rc::Rc;

use crate::baseline::{BaselineStore, NoBaselines, NoServerErrors, ServerErrors};
use crate::catalog::LinkTypes;
use crate::entity::{EntityCache, EntityResolver};
use crate::messages::Messages;
use crate::target::{DirectSwap, TargetChanger};
use crate::watch::NameWatchRegistry;

/// Everything a [`Relationship`](crate::Relationship) consumes from outside.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct Context {
    catalog: Rc<dyn LinkTypes>,
    baselines: Rc<dyn BaselineStore>,
    server_errors: Rc<dyn ServerErrors>,
    resolver: Rc<dyn EntityResolver>,
    changer: Rc<dyn TargetChanger>,
    messages: Rc<Messages>,
    watchers: Rc<NameWatchRegistry>,
}

impl Context {
    /// Start from `catalog` with default collaborators.
    #[must_use]
    pub fn builder<C: LinkTypes + 'static>(catalog: Rc<C>) -> ContextBuilder {
        ContextBuilder {
            cx: Self {
                catalog,
                baselines: Rc::new(NoBaselines),
                server_errors: Rc::new(NoServerErrors),
                resolver: Rc::new(EntityCache::new()),
                changer: Rc::new(DirectSwap),
                messages: Rc::new(Messages::english()),
                watchers: Rc::new(NameWatchRegistry::new()),
            },
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Rc<dyn LinkTypes> {
        &self.catalog
    }

    #[must_use]
    pub fn baselines(&self) -> &Rc<dyn BaselineStore> {
        &self.baselines
    }

    #[must_use]
    pub fn server_errors(&self) -> &Rc<dyn ServerErrors> {
        &self.server_errors
    }

    #[must_use]
    pub fn resolver(&self) -> &Rc<dyn EntityResolver> {
        &self.resolver
    }

    #[must_use]
    pub fn changer(&self) -> &Rc<dyn TargetChanger> {
        &self.changer
    }

    #[must_use]
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    #[must_use]
    pub fn messages_rc(&self) -> Rc<Messages> {
        Rc::clone(&self.messages)
    }

    #[must_use]
    pub fn watchers(&self) -> &Rc<NameWatchRegistry> {
        &self.watchers
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("messages", &self.messages)
            .field("watchers", &self.watchers)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Context`].
#[must_use]
pub struct ContextBuilder {
    cx: Context,
}

impl ContextBuilder {
    pub fn baselines<B: BaselineStore + 'static>(mut self, baselines: Rc<B>) -> Self {
        self.cx.baselines = baselines;
        self
    }

    pub fn server_errors<E: ServerErrors + 'static>(mut self, errors: Rc<E>) -> Self {
        self.cx.server_errors = errors;
        self
    }

    pub fn resolver<R: EntityResolver + 'static>(mut self, resolver: Rc<R>) -> Self {
        self.cx.resolver = resolver;
        self
    }

    pub fn changer<T: TargetChanger + 'static>(mut self, changer: Rc<T>) -> Self {
        self.cx.changer = changer;
        self
    }

    pub fn messages(mut self, messages: Messages) -> Self {
        self.cx.messages = Rc::new(messages);
        self
    }

    /// Share a watch registry with another context.
    pub fn watchers(mut self, watchers: Rc<NameWatchRegistry>) -> Self {
        self.cx.watchers = watchers;
        self
    }

    pub fn build(self) -> Context {
        self.cx
    }
}
