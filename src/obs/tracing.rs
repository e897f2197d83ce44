// self
use crate::{_prelude::*, obs::RequestKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span builder used by gateway requests.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a span for one request to `url`, tagged with its kind and the calling stage.
	pub fn new(kind: RequestKind, stage: &'static str, url: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::debug_span!("clinic_gateway.request", kind = kind.as_str(), stage, url);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, url);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event about `subject` (a URL, prefix, or route).
pub fn debug_event(message: &'static str, subject: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(subject, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (message, subject);
	}
}

/// Emits a warning event about `subject`.
pub fn warn_event(message: &'static str, subject: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(subject, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (message, subject);
	}
}
