//! Submission: wrapping the caller's lifecycle callbacks around the form's
//! own state transitions, then delegating to the dispatcher.

use std::time::Duration;

use peregrine_core::{CancelToken, Errors, Method, Page, Progress, Visit, VisitOptions};

use crate::{Form, FormData, FormError};

/// How long [`Form::recently_successful`] stays set after a success.
pub const RECENTLY_SUCCESSFUL_WINDOW: Duration = Duration::from_millis(2000);

impl<T: FormData> Form<T> {
    /// Submit the form through the dispatcher.
    ///
    /// The payload is the transform's output (or the serialized data record
    /// when no transform is set). Every caller-supplied lifecycle callback
    /// in `options` is wrapped: the form's internal state transition runs
    /// first, then the caller's callback, whose return value is what the
    /// dispatcher sees, so returning `false` from `on_before` still aborts
    /// the visit.
    ///
    /// Returns once the visit is handed to the dispatcher; the outcome
    /// arrives later through the callbacks. The only failure here is a
    /// payload that won't serialize.
    pub fn submit(
        &self,
        method: Method,
        url: impl Into<String>,
        options: VisitOptions,
    ) -> Result<(), FormError> {
        let url = url.into();
        let data = self.data();
        let payload = match &self.inner.transform {
            Some(transform) => transform(&data, method)?,
            None => serde_json::to_value(&data)?,
        };

        tracing::debug!(%method, url = %url, "submitting form");

        let mut caller = options;
        let mut on_cancel_token = caller.on_cancel_token.take();
        let mut on_before = caller.on_before.take();
        let mut on_start = caller.on_start.take();
        let mut on_progress = caller.on_progress.take();
        let mut on_success = caller.on_success.take();
        let mut on_error = caller.on_error.take();
        let mut on_cancel = caller.on_cancel.take();
        let mut on_finish = caller.on_finish.take();

        let wrapped = VisitOptions {
            data: caller.data,
            headers: caller.headers,
            preserve_scroll: caller.preserve_scroll,
            preserve_state: caller.preserve_state,
            replace: caller.replace,
            on_cancel_token: Some(Box::new({
                let form = self.clone();
                move |token: CancelToken| {
                    form.inner.state.borrow_mut().cancel_token = Some(token.clone());
                    if let Some(f) = on_cancel_token.as_mut() {
                        f(token);
                    }
                }
            })),
            on_before: Some(Box::new({
                let form = self.clone();
                move |visit: &Visit| {
                    form.with_state(|state| {
                        state.was_successful = false;
                        state.recently_successful = false;
                        if let Some(timer) = state.recently_successful_timer.take() {
                            timer.cancel();
                        }
                    });
                    match on_before.as_mut() {
                        Some(f) => f(visit),
                        None => true,
                    }
                }
            })),
            on_start: Some(Box::new({
                let form = self.clone();
                move |visit: &Visit| {
                    form.with_state(|state| state.processing = true);
                    if let Some(f) = on_start.as_mut() {
                        f(visit);
                    }
                }
            })),
            on_progress: Some(Box::new({
                let form = self.clone();
                move |progress: &Progress| {
                    form.with_state(|state| state.progress = Some(*progress));
                    if let Some(f) = on_progress.as_mut() {
                        f(progress);
                    }
                }
            })),
            on_success: Some(Box::new({
                let form = self.clone();
                move |page: &Page| {
                    if form.inner.mounted.get() {
                        form.with_state(|state| {
                            state.processing = false;
                            state.progress = None;
                            state.errors.clear();
                            state.has_errors = false;
                            state.was_successful = true;
                            state.recently_successful = true;
                        });
                        let timer = {
                            let form = form.clone();
                            form.inner.scheduler.clone().delay(
                                RECENTLY_SUCCESSFUL_WINDOW,
                                Box::new(move || {
                                    if form.inner.mounted.get() {
                                        form.with_state(|state| state.recently_successful = false);
                                    }
                                }),
                            )
                        };
                        form.inner.state.borrow_mut().recently_successful_timer = Some(timer);
                    }
                    if let Some(f) = on_success.as_mut() {
                        f(page);
                    }
                }
            })),
            on_error: Some(Box::new({
                let form = self.clone();
                move |errors: &Errors| {
                    if form.inner.mounted.get() {
                        form.with_state(|state| {
                            state.processing = false;
                            state.progress = None;
                            state.errors = errors.clone();
                            state.has_errors = true;
                        });
                    }
                    if let Some(f) = on_error.as_mut() {
                        f(errors);
                    }
                }
            })),
            on_cancel: Some(Box::new({
                let form = self.clone();
                move || {
                    if form.inner.mounted.get() {
                        form.with_state(|state| {
                            state.processing = false;
                            state.progress = None;
                        });
                    }
                    if let Some(f) = on_cancel.as_mut() {
                        f();
                    }
                }
            })),
            on_finish: Some(Box::new({
                let form = self.clone();
                move || {
                    if form.inner.mounted.get() {
                        form.with_state(|state| {
                            state.processing = false;
                            state.progress = None;
                        });
                    }
                    // the token is cleared even when unmounted
                    form.inner.state.borrow_mut().cancel_token = None;
                    if let Some(f) = on_finish.as_mut() {
                        f();
                    }
                }
            })),
        };

        if method == Method::Delete {
            let mut wrapped = wrapped;
            wrapped.data = Some(payload);
            self.inner.dispatcher.delete(&url, wrapped);
        } else {
            self.inner.dispatcher.submit(method, &url, payload, wrapped);
        }
        Ok(())
    }

    /// Submit with the get verb.
    pub fn get(&self, url: impl Into<String>, options: VisitOptions) -> Result<(), FormError> {
        self.submit(Method::Get, url, options)
    }

    /// Submit with the post verb.
    pub fn post(&self, url: impl Into<String>, options: VisitOptions) -> Result<(), FormError> {
        self.submit(Method::Post, url, options)
    }

    /// Submit with the put verb.
    pub fn put(&self, url: impl Into<String>, options: VisitOptions) -> Result<(), FormError> {
        self.submit(Method::Put, url, options)
    }

    /// Submit with the patch verb.
    pub fn patch(&self, url: impl Into<String>, options: VisitOptions) -> Result<(), FormError> {
        self.submit(Method::Patch, url, options)
    }

    /// Submit with the delete verb. The payload rides in the visit options,
    /// as the dispatcher contract requires for this verb.
    pub fn delete(&self, url: impl Into<String>, options: VisitOptions) -> Result<(), FormError> {
        self.submit(Method::Delete, url, options)
    }
}
