use crate::device::{Channel, PRODUCT_ID, VENDOR_ID};
use crate::error::Result;
use crate::state::DriverContext;
use crate::transport::{Session, Transport};
use std::sync::Arc;

/// Owns the transport and moves the receiver between detached and attached.
///
/// Attached means a session sits in the shared context with all four
/// controller interfaces claimed.
pub struct SessionManager<T: Transport> {
    transport: T,
}

impl<T: Transport> SessionManager<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Open the receiver and claim every controller interface.
    ///
    /// On failure the context stays detached and interfaces claimed so far are released.
    pub fn attach(&self, ctx: &DriverContext<T::Session>) -> Result<()> {
        let mut session = self.transport.open(VENDOR_ID, PRODUCT_ID)?;

        for (claimed, channel) in Channel::ALL.iter().enumerate() {
            if let Err(e) = session.claim_interface(channel.interface()) {
                for earlier in &Channel::ALL[..claimed] {
                    release(&mut session, *earlier);
                }
                return Err(e);
            }
        }

        let mut inner = ctx.lock_inner();
        inner.reset_states();
        inner.session = Some(Arc::new(session));
        log::info!("Wireless receiver attached");
        Ok(())
    }

    /// Drop the session (if any), releasing its interfaces, and zero all state.
    ///
    /// Interfaces are only released when the context holds the last reference
    /// to the session, so callers must drop their own clones first. Otherwise
    /// the handle closes once the last clone goes, without an explicit release.
    pub fn detach(&self, ctx: &DriverContext<T::Session>) {
        let session = {
            let mut inner = ctx.lock_inner();
            inner.reset_states();
            inner.session.take()
        };
        let Some(session) = session else {
            return;
        };

        match Arc::try_unwrap(session) {
            Ok(mut session) => {
                for channel in Channel::ALL {
                    release(&mut session, channel);
                }
            }
            Err(_) => log::warn!("Receiver session still in use during teardown"),
        }
        log::info!("Wireless receiver detached");
    }
}

fn release<S: Session>(session: &mut S, channel: Channel) {
    if let Err(e) = session.release_interface(channel.interface()) {
        log::debug!("Failed to release interface {}: {}", channel.interface(), e);
    }
}
