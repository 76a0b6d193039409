use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use peregrine_core::{
    CancelToken, DelayHandle, Dispatcher, Errors, Method, Progress, RememberStore, Scheduler,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::fields::{from_object, to_object};
use crate::{FormError, SetData, SetDefaults, SetError};

/// Marker for types usable as form data records.
///
/// Structural equality (the derived `PartialEq`) is what dirtiness is
/// measured with; serde is how fields are addressed by name.
pub trait FormData: Serialize + DeserializeOwned + Clone + PartialEq + 'static {}
impl<T> FormData for T where T: Serialize + DeserializeOwned + Clone + PartialEq + 'static {}

/// A caller-supplied payload transform, applied at submit time.
pub type Transform<T> = Box<dyn Fn(&T, Method) -> Result<Value, serde_json::Error>>;

pub(crate) struct FormState<T> {
    pub(crate) data: T,
    pub(crate) defaults: T,
    pub(crate) errors: Errors,
    pub(crate) has_errors: bool,
    pub(crate) processing: bool,
    pub(crate) progress: Option<Progress>,
    pub(crate) was_successful: bool,
    pub(crate) recently_successful: bool,
    pub(crate) cancel_token: Option<CancelToken>,
    pub(crate) recently_successful_timer: Option<DelayHandle>,
}

pub(crate) struct RememberSlot {
    pub(crate) key: String,
    pub(crate) store: Rc<dyn RememberStore>,
}

impl RememberSlot {
    pub(crate) fn data_key(&self) -> String {
        format!("{}:data", self.key)
    }

    pub(crate) fn errors_key(&self) -> String {
        format!("{}:errors", self.key)
    }
}

pub(crate) struct FormInner<T> {
    pub(crate) state: RefCell<FormState<T>>,
    pub(crate) dispatcher: Rc<dyn Dispatcher>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
    pub(crate) transform: Option<Transform<T>>,
    pub(crate) remember: Option<RememberSlot>,
    pub(crate) mounted: Cell<bool>,
}

/// The form controller.
///
/// `Form<T>` owns a data record, a defaults snapshot, an error bag, and the
/// in-flight status flags, and submits the record through a
/// [`Dispatcher`]'s visit lifecycle. It is a cheap clonable handle; clones
/// share state, which is how the lifecycle callbacks reach back into it.
///
/// ```rust
/// use std::rc::Rc;
/// use peregrine_core::{ManualScheduler, MemoryDispatcher};
/// use peregrine_form::Form;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Serialize, Deserialize)]
/// struct Login {
///     email: String,
/// }
///
/// let form = Form::new(
///     Rc::new(MemoryDispatcher::new()),
///     Rc::new(ManualScheduler::new()),
///     Login { email: String::new() },
/// );
///
/// form.set_field("email", "ada@example.com").unwrap();
/// assert!(form.is_dirty());
/// form.reset();
/// assert!(!form.is_dirty());
/// ```
pub struct Form<T: FormData> {
    pub(crate) inner: Rc<FormInner<T>>,
}

impl<T: FormData> Clone for Form<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Builder for [`Form`].
pub struct FormBuilder<T: FormData> {
    dispatcher: Rc<dyn Dispatcher>,
    scheduler: Rc<dyn Scheduler>,
    initial: T,
    transform: Option<Transform<T>>,
    remember: Option<RememberSlot>,
}

impl<T: FormData> FormBuilder<T> {
    /// Transform the payload at submit time instead of serializing the data
    /// record as-is. The transform is authoritative: whatever it returns is
    /// what the dispatcher receives.
    pub fn transform(
        mut self,
        f: impl Fn(&T, Method) -> Result<Value, serde_json::Error> + 'static,
    ) -> Self {
        self.transform = Some(Box::new(f));
        self
    }

    /// Mirror data and errors into `store` under `{key}:data` and
    /// `{key}:errors`, and restore them from there on build.
    pub fn remember(mut self, key: impl Into<String>, store: Rc<dyn RememberStore>) -> Self {
        self.remember = Some(RememberSlot {
            key: key.into(),
            store,
        });
        self
    }

    /// Build the form, restoring remembered state when configured.
    pub fn build(self) -> Form<T> {
        let mut data = self.initial.clone();
        let mut errors = Errors::default();

        if let Some(slot) = &self.remember {
            if let Some(snapshot) = slot.store.get(&slot.data_key()) {
                match serde_json::from_value::<T>(snapshot) {
                    Ok(restored) => data = restored,
                    Err(error) => {
                        tracing::debug!(%error, key = %slot.key, "ignoring ill-typed remembered data")
                    }
                }
            }
            if let Some(snapshot) = slot.store.get(&slot.errors_key()) {
                match serde_json::from_value::<Errors>(snapshot) {
                    Ok(restored) => errors = restored,
                    Err(error) => {
                        tracing::debug!(%error, key = %slot.key, "ignoring ill-typed remembered errors")
                    }
                }
            }
        }

        let has_errors = !errors.is_empty();
        Form {
            inner: Rc::new(FormInner {
                state: RefCell::new(FormState {
                    data,
                    defaults: self.initial,
                    errors,
                    has_errors,
                    processing: false,
                    progress: None,
                    was_successful: false,
                    recently_successful: false,
                    cancel_token: None,
                    recently_successful_timer: None,
                }),
                dispatcher: self.dispatcher,
                scheduler: self.scheduler,
                transform: self.transform,
                remember: self.remember,
                mounted: Cell::new(true),
            }),
        }
    }
}

impl<T: FormData> Form<T> {
    /// Start building a form over the given seams and initial values.
    ///
    /// The initial values become both `data` and the `defaults` baseline
    /// dirtiness is measured against.
    pub fn builder(
        dispatcher: Rc<dyn Dispatcher>,
        scheduler: Rc<dyn Scheduler>,
        initial: T,
    ) -> FormBuilder<T> {
        FormBuilder {
            dispatcher,
            scheduler,
            initial,
            transform: None,
            remember: None,
        }
    }

    /// A form with no transform and no remembered state.
    pub fn new(dispatcher: Rc<dyn Dispatcher>, scheduler: Rc<dyn Scheduler>, initial: T) -> Self {
        Self::builder(dispatcher, scheduler, initial).build()
    }

    // -- snapshots ----------------------------------------------------------

    /// The current data record.
    pub fn data(&self) -> T {
        self.inner.state.borrow().data.clone()
    }

    /// The defaults snapshot dirtiness is measured against.
    pub fn defaults(&self) -> T {
        self.inner.state.borrow().defaults.clone()
    }

    /// The current error bag.
    pub fn errors(&self) -> Errors {
        self.inner.state.borrow().errors.clone()
    }

    /// The error message for one field, if any.
    pub fn error(&self, field: &str) -> Option<String> {
        self.inner.state.borrow().errors.get(field).cloned()
    }

    /// Whether the error bag is non-empty.
    pub fn has_errors(&self) -> bool {
        self.inner.state.borrow().has_errors
    }

    /// Whether a submission is in flight.
    pub fn processing(&self) -> bool {
        self.inner.state.borrow().processing
    }

    /// The most recent upload progress event, while a submission with a
    /// body is in flight.
    pub fn progress(&self) -> Option<Progress> {
        self.inner.state.borrow().progress
    }

    /// Whether the last settled submission succeeded.
    pub fn was_successful(&self) -> bool {
        self.inner.state.borrow().was_successful
    }

    /// True for a short window after a successful submission.
    pub fn recently_successful(&self) -> bool {
        self.inner.state.borrow().recently_successful
    }

    /// Whether the data differs structurally from the defaults snapshot.
    pub fn is_dirty(&self) -> bool {
        let state = self.inner.state.borrow();
        state.data != state.defaults
    }

    // -- data ---------------------------------------------------------------

    /// Change the data record. No validation happens here; the mutation is
    /// purely structural.
    pub fn set_data(&self, update: SetData<T>) -> Result<(), FormError> {
        match update {
            SetData::Replace(data) => {
                self.with_state(|state| state.data = data);
                Ok(())
            }
            SetData::With(f) => {
                let next = f(&self.data());
                self.with_state(|state| state.data = next);
                Ok(())
            }
            SetData::Field(field, value) => {
                let mut map = to_object(&self.inner.state.borrow().data)?;
                if !map.contains_key(&field) {
                    return Err(FormError::UnknownField(field));
                }
                map.insert(field, value);
                let data = from_object::<T>(map)?;
                self.with_state(|state| state.data = data);
                Ok(())
            }
        }
    }

    /// Replace the whole data record.
    pub fn set(&self, data: T) {
        self.with_state(|state| state.data = data);
    }

    /// Compute the new data record from the old one with a pure function.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.data());
        self.with_state(|state| state.data = next);
    }

    /// Set a single field by name. A value that doesn't fit the record's
    /// shape leaves state untouched and returns the error.
    pub fn set_field(&self, field: &str, value: impl Serialize) -> Result<(), FormError> {
        let value = serde_json::to_value(value)?;
        self.set_data(SetData::Field(field.to_string(), value))
    }

    // -- defaults -----------------------------------------------------------

    /// Change the defaults snapshot without touching data.
    pub fn set_defaults(&self, update: SetDefaults) -> Result<(), FormError> {
        match update {
            SetDefaults::Rebase => {
                self.rebase_defaults();
                Ok(())
            }
            SetDefaults::Field(field, value) => {
                let mut patch = Map::new();
                patch.insert(field, value);
                self.merge_defaults_map(patch)
            }
            SetDefaults::Merge(patch) => self.merge_defaults_map(patch),
        }
    }

    /// Rebase the defaults to the current data.
    pub fn rebase_defaults(&self) {
        self.with_state(|state| state.defaults = state.data.clone());
    }

    /// Set a single default field by name.
    pub fn set_default(&self, field: &str, value: impl Serialize) -> Result<(), FormError> {
        let value = serde_json::to_value(value)?;
        self.set_defaults(SetDefaults::Field(field.to_string(), value))
    }

    /// Merge several default fields at once.
    pub fn merge_defaults(&self, patch: Map<String, Value>) -> Result<(), FormError> {
        self.set_defaults(SetDefaults::Merge(patch))
    }

    fn merge_defaults_map(&self, patch: Map<String, Value>) -> Result<(), FormError> {
        let mut map = to_object(&self.inner.state.borrow().defaults)?;
        for (field, value) in patch {
            if !map.contains_key(&field) {
                return Err(FormError::UnknownField(field));
            }
            map.insert(field, value);
        }
        let defaults = from_object::<T>(map)?;
        self.with_state(|state| state.defaults = defaults);
        Ok(())
    }

    // -- reset --------------------------------------------------------------

    /// Reset all of the data back to the defaults snapshot.
    pub fn reset(&self) {
        self.with_state(|state| state.data = state.defaults.clone());
    }

    /// Copy only the named fields from defaults into data, leaving the rest
    /// as they are. Names that aren't fields of the record are ignored; an
    /// empty list resets everything.
    pub fn reset_fields(&self, fields: &[&str]) -> Result<(), FormError> {
        if fields.is_empty() {
            self.reset();
            return Ok(());
        }
        let (defaults_map, mut data_map) = {
            let state = self.inner.state.borrow();
            (to_object(&state.defaults)?, to_object(&state.data)?)
        };
        for field in fields {
            if let Some(value) = defaults_map.get(*field) {
                data_map.insert((*field).to_string(), value.clone());
            }
        }
        let data = from_object::<T>(data_map)?;
        self.with_state(|state| state.data = data);
        Ok(())
    }

    // -- errors -------------------------------------------------------------

    /// Merge into the error bag.
    pub fn set_error(&self, update: SetError) {
        self.with_state(|state| {
            match update {
                SetError::Field(field, message) => {
                    state.errors.insert(field, message);
                }
                SetError::Many(errors) => {
                    state.errors.extend(errors);
                }
            }
            state.has_errors = !state.errors.is_empty();
        });
    }

    /// Set the message for one field.
    pub fn set_field_error(&self, field: impl Into<String>, message: impl Into<String>) {
        self.set_error(SetError::Field(field.into(), message.into()));
    }

    /// Merge several field messages at once.
    pub fn set_errors(&self, errors: Errors) {
        self.set_error(SetError::Many(errors));
    }

    /// Clear the whole error bag.
    pub fn clear_errors(&self) {
        self.with_state(|state| {
            state.errors.clear();
            state.has_errors = false;
        });
    }

    /// Remove only the named fields from the error bag.
    pub fn clear_field_errors(&self, fields: &[&str]) {
        self.with_state(|state| {
            state.errors.retain(|field, _| !fields.contains(&field.as_str()));
            state.has_errors = !state.errors.is_empty();
        });
    }

    // -- lifecycle ----------------------------------------------------------

    /// Abort the in-flight submission, if any. No-op otherwise.
    pub fn cancel(&self) {
        let token = self.inner.state.borrow().cancel_token.clone();
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Detach the controller from its host component. Deferred state
    /// mutations (lifecycle callbacks, the recently-successful timer)
    /// become no-ops from here on.
    pub fn unmount(&self) {
        self.inner.mounted.set(false);
    }

    // -- internals ----------------------------------------------------------

    /// Run a state mutation, then mirror data and errors into the remember
    /// store when one is configured.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut FormState<T>) -> R) -> R {
        let result = {
            let mut state = self.inner.state.borrow_mut();
            f(&mut state)
        };
        self.persist();
        result
    }

    fn persist(&self) {
        let Some(slot) = &self.inner.remember else {
            return;
        };
        let state = self.inner.state.borrow();
        match serde_json::to_value(&state.data) {
            Ok(snapshot) => slot.store.set(&slot.data_key(), snapshot),
            Err(error) => tracing::error!(%error, "failed to mirror form data"),
        }
        match serde_json::to_value(&state.errors) {
            Ok(snapshot) => slot.store.set(&slot.errors_key(), snapshot),
            Err(error) => tracing::error!(%error, "failed to mirror form errors"),
        }
    }
}

impl<T: FormData + fmt::Debug> fmt::Debug for Form<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Form")
            .field("data", &state.data)
            .field("errors", &state.errors)
            .field("processing", &state.processing)
            .field("is_dirty", &(state.data != state.defaults))
            .finish_non_exhaustive()
    }
}
