// libnfcdisc/src/engine/collision.rs

use std::task::Poll;

use log::{debug, warn};

use super::Engine;
use super::state::ResolveStep;
use crate::Result;
use crate::device::DeviceRecord;
use crate::technology::{POLL_ORDER, Technology};

impl Engine {
    /// Identify the devices of every detected technology, filling the
    /// device list up to the limit. A failing technology is skipped.
    pub(super) fn resolve(&mut self, step: &mut ResolveStep) -> Poll<Result<()>> {
        let limit = self.params.device_limit as usize;
        if self.devices.len() >= limit {
            return Poll::Ready(Ok(()));
        }

        for &tech in POLL_ORDER {
            // AP2P was already activated during detection
            if tech == Technology::Ap2p {
                continue;
            }
            if !self.techs_found.contains(tech.mask()) || !self.techs_todo.contains(tech.mask()) {
                continue;
            }

            if *step == ResolveStep::Next {
                self.fe.poller_initialize(tech, self.poll_bit_rate(tech))?;
                // Other technologies may have toggled the field since detection
                self.fe.field_on_and_start_gt()?;
                *step = ResolveStep::GuardTime(tech);
            }
            if !self.fe.is_gt_expired() {
                return Poll::Pending;
            }

            if let ResolveStep::GuardTime(_) = *step {
                let capacity = limit - self.devices.len();
                if let Err(e) =
                    self.fe
                        .start_collision_resolution(tech, self.params.compliance, capacity)
                {
                    warn!("{} collision resolution not started: {}", tech, e);
                    self.finish_technology(tech, step);
                    return Poll::Pending;
                }
                *step = ResolveStep::Resolving(tech);
                // NFC-A runs a full anti-collision tree over several ticks
                if tech == Technology::NfcA {
                    return Poll::Pending;
                }
            }

            match self.fe.collision_resolution_status() {
                Poll::Pending => {}
                Poll::Ready(Ok(found)) => {
                    let room = limit.saturating_sub(self.devices.len());
                    debug!("{}: {} device(s) resolved", tech, found.len());
                    self.devices
                        .extend(found.into_iter().take(room).map(DeviceRecord::listener));
                    self.finish_technology(tech, step);
                }
                Poll::Ready(Err(e)) => {
                    warn!("{} collision resolution failed: {}", tech, e);
                    self.finish_technology(tech, step);
                }
            }
            return Poll::Pending;
        }
        Poll::Ready(Ok(()))
    }

    fn finish_technology(&mut self, tech: Technology, step: &mut ResolveStep) {
        self.techs_todo.remove(tech.mask());
        *step = ResolveStep::Next;
    }
}
