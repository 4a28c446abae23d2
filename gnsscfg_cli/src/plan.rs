use gnsscfg::{Catalog, Command, CommandKind, Error};
use log::warn;

/// One sentence switched on (USART1 only) or off (all ports)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateChange {
    pub id: String,
    pub enable: bool,
}

impl RateChange {
    pub fn enable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enable: true,
        }
    }

    pub fn disable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enable: false,
        }
    }
}

/// Commands picked on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// `--enable` and `--disable` values in command line order
    pub rates: Vec<RateChange>,
    pub set_baud: Option<u32>,
    pub ubx_baud: Option<u32>,
    pub persist: bool,
    pub standard: bool,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
            && self.set_baud.is_none()
            && self.ubx_baud.is_none()
            && !self.persist
            && !self.standard
    }
}

/// The NMEA rate sentences of the standard catalog, sent when nothing else is
/// selected
pub fn standard_nmea() -> Result<Catalog, Error> {
    let mut plan = Catalog::new();
    for command in Catalog::standard()?.iter() {
        if matches!(command.kind(), CommandKind::PubxEnable | CommandKind::PubxDisable) {
            plan.insert(command.clone());
        }
    }
    Ok(plan)
}

/// Record the setting of one sentence. A sentence keeps its first position,
/// the latest setting wins.
fn set_rate(rates: &mut Vec<(String, bool)>, id: &str, enable: bool) {
    let id = id.to_ascii_uppercase();
    match rates.iter_mut().find(|(known, _)| *known == id) {
        Some(entry) => entry.1 = enable,
        None => rates.push((id, enable)),
    }
}

/// Turn a selection into the ordered list of commands to send.
///
/// Order is enables, disables, PUBX baud change, UBX baud change, save, with
/// at most one command of each baud kind. With `--standard` the command line
/// selections are merged into the standard set: a sentence is enabled or
/// disabled according to the last flag naming it, `--set-baud` replaces the
/// standard baud rate for both baud commands unless `--ubx-baud` is given,
/// and save-all stays last.
pub fn build_plan(selection: &Selection) -> Result<Catalog, Error> {
    if selection.is_empty() {
        return standard_nmea();
    }

    let mut rates = Vec::new();
    if selection.standard {
        for id in Catalog::STANDARD_ENABLED {
            set_rate(&mut rates, id, true);
        }
        for id in Catalog::STANDARD_DISABLED {
            set_rate(&mut rates, id, false);
        }
    }
    for change in &selection.rates {
        set_rate(&mut rates, &change.id, change.enable);
    }

    let pubx_baud = selection
        .set_baud
        .or(selection.standard.then_some(Catalog::STANDARD_BAUD));
    let ubx_baud = match selection.ubx_baud {
        Some(baud) => Some(baud),
        None if selection.standard => pubx_baud,
        None => None,
    };
    if let (Some(pubx), Some(ubx)) = (pubx_baud, ubx_baud) {
        if pubx != ubx {
            warn!(
                "UBX baud change to {} differs from the PUBX baud change to {}, later commands may not reach the receiver",
                ubx, pubx
            );
        }
    }

    let mut plan = Catalog::new();
    for (id, _) in rates.iter().filter(|(_, enable)| *enable) {
        plan.insert(Command::enable(id)?);
    }
    for (id, _) in rates.iter().filter(|(_, enable)| !*enable) {
        plan.insert(Command::disable(id)?);
    }
    if let Some(baud) = pubx_baud {
        plan.insert(Command::baud(baud)?);
    }
    if let Some(baud) = ubx_baud {
        plan.insert(Command::ubx_baud(baud)?);
    }
    if selection.persist || selection.standard {
        plan.insert(Command::save_all()?);
    }
    Ok(plan)
}
