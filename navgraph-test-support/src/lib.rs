//! Shared test utilities used across navgraph crates.

pub mod tracing {
    //! A `tracing` layer that records spans and events for assertions.

    use std::{
        collections::HashMap,
        fmt,
        sync::{Arc, Mutex, MutexGuard},
    };

    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
        span::{Attributes, Id, Record},
    };
    use tracing_subscriber::{
        Layer, layer::Context, layer::SubscriberExt, registry::LookupSpan,
    };

    /// Closed span with the fields recorded over its lifetime.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub struct SpanRecord {
        pub name: String,
        pub fields: HashMap<String, String>,
    }

    /// Emitted event. The message, when present, is stored under `message`.
    #[derive(Clone, Debug, Eq, PartialEq)]
    pub struct EventRecord {
        pub level: Level,
        pub target: String,
        pub fields: HashMap<String, String>,
    }

    impl EventRecord {
        /// Returns the rendered value of `field`, if recorded.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }

        #[must_use]
        pub fn message(&self) -> Option<&str> {
            self.field("message")
        }
    }

    #[derive(Debug, Default)]
    struct Records {
        spans: Vec<SpanRecord>,
        events: Vec<EventRecord>,
    }

    /// Layer capturing closed spans and events in order.
    ///
    /// Clones share storage, so a test keeps one handle and installs another.
    ///
    /// # Examples
    /// ```
    /// use navgraph_test_support::tracing::RecordingLayer;
    ///
    /// let (value, layer) = RecordingLayer::capture(|| {
    ///     tracing::warn!(attempt = 3, "retrying");
    ///     7
    /// });
    /// assert_eq!(value, 7);
    /// let event = layer.find_event("retrying").expect("event recorded");
    /// assert_eq!(event.field("attempt"), Some("3"));
    /// ```
    #[derive(Clone, Debug, Default)]
    pub struct RecordingLayer {
        records: Arc<Mutex<Records>>,
    }

    impl RecordingLayer {
        /// Runs `f` with a fresh layer installed as the thread's default
        /// subscriber and returns its result alongside the layer.
        pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Self) {
            let layer = Self::default();
            let subscriber = tracing_subscriber::registry().with(layer.clone());
            let value = tracing::subscriber::with_default(subscriber, f);
            (value, layer)
        }

        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            self.lock().spans.clone()
        }

        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            self.lock().events.clone()
        }

        /// Events emitted at exactly `level`.
        #[must_use]
        pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
            self.lock()
                .events
                .iter()
                .filter(|event| event.level == level)
                .cloned()
                .collect()
        }

        /// First event whose message contains `needle`.
        #[must_use]
        pub fn find_event(&self, needle: &str) -> Option<EventRecord> {
            self.lock()
                .events
                .iter()
                .find(|event| event.message().is_some_and(|message| message.contains(needle)))
                .cloned()
        }

        /// First closed span called `name`.
        #[must_use]
        pub fn find_span(&self, name: &str) -> Option<SpanRecord> {
            self.lock()
                .spans
                .iter()
                .find(|span| span.name == name)
                .cloned()
        }

        fn lock(&self) -> MutexGuard<'_, Records> {
            self.records
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    /// Fields accumulated on an open span.
    struct OpenSpan(SpanRecord);

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut record = SpanRecord {
                name: attrs.metadata().name().to_owned(),
                fields: HashMap::new(),
            };
            attrs.record(&mut Fields(&mut record.fields));
            span.extensions_mut().insert(OpenSpan(record));
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            if let Some(open) = span.extensions_mut().get_mut::<OpenSpan>() {
                values.record(&mut Fields(&mut open.0.fields));
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            if let Some(OpenSpan(record)) = span.extensions_mut().remove::<OpenSpan>() {
                self.lock().spans.push(record);
            }
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut Fields(&mut fields));
            self.lock().events.push(EventRecord {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                fields,
            });
        }
    }

    /// Renders strings verbatim and everything else through `Debug`.
    struct Fields<'a>(&'a mut HashMap<String, String>);

    impl Visit for Fields<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_owned(), value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_owned(), format!("{value:?}"));
        }
    }

}
