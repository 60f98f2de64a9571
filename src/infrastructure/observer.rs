//! Logging adapter for banned hits.

use crate::application::ports::BanObserver;
use crate::domain::{message::Event, source::SourceIdentity};

/// Logs every shadow-rejected event as a `warn` tracing event.
///
/// The event carries `source`, `source_kind`, `pubkey`, `kind` and `id`
/// fields so operators can see who keeps publishing while banned.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBanObserver;

impl BanObserver for TracingBanObserver {
    fn on_shadow_reject(&self, source: &SourceIdentity, event: &Event) {
        tracing::warn!(
            source = %source.value,
            source_kind = %source.kind,
            pubkey = %event.pubkey,
            kind = event.kind,
            id = %event.id,
            "Banned rate-limited source"
        );
    }
}
