// libnfcdisc/src/engine/deactivate.rs

use log::{debug, info, warn};

use super::Engine;
use super::state::Phase;
#[cfg(any(feature = "iso-dep", feature = "nfc-dep"))]
use crate::types::RfInterface;
use crate::{Error, Result};

impl Engine {
    /// Leave the current device or discovery run.
    ///
    /// With `restart` (and technologies to search) the farewell and field
    /// off happen on the next `poll`, which then starts a new discovery
    /// cycle. Otherwise everything is torn down now and the engine is
    /// `Idle` on return.
    pub fn deactivate(&mut self, restart: bool) -> Result<()> {
        if self.state() <= super::State::Idle {
            return Err(Error::WrongState);
        }
        if restart && !self.params.techs.is_empty() {
            self.disc_restart = true;
            self.enter(Phase::Deactivation);
        } else {
            self.deactivate_link();
            self.enter(Phase::Idle);
            info!("discovery stopped");
        }
        Ok(())
    }

    /// Send the protocol farewell to an activated remote listener, stop
    /// every radio mode and forget the active device
    pub(super) fn deactivate_link(&mut self) {
        if let Some(rec) = self.active.take().and_then(|idx| self.devices.get(idx)) {
            // In listener role the remote poller ends the link
            if rec.is_remote_listener() && !self.params.skip_deactivation {
                let res: Result<()> = match rec.interface {
                    #[cfg(feature = "iso-dep")]
                    Some(RfInterface::IsoDep) => self.fe.isodep_deselect(),
                    #[cfg(feature = "nfc-dep")]
                    Some(RfInterface::NfcDep) => {
                        if rec.technology() == Some(crate::technology::Technology::Ap2p) {
                            self.fe.nfcdep_release()
                        } else {
                            self.fe.nfcdep_deselect()
                        }
                    }
                    _ => Ok(()),
                };
                match res {
                    Ok(()) => debug!("farewell sent to {}", rec),
                    Err(e) => warn!("farewell to {} failed: {}", rec, e),
                }
            }
        }

        #[cfg(feature = "wakeup")]
        if let Err(e) = self.fe.wakeup_stop() {
            warn!("wake-up stop failed: {}", e);
        }
        #[cfg(feature = "listen")]
        if let Err(e) = self.fe.listen_stop() {
            warn!("listen stop failed: {}", e);
        }
        if let Err(e) = self.fe.field_off() {
            warn!("field off failed: {}", e);
        }
        self.exchange = None;
    }
}
