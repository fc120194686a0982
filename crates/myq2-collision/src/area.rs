// area.rs — area connectivity through openable portals (doors)
//
// The area graph is fixed by the map. Which portals are open changes at run
// time, so that state lives in a caller-owned `PortalState`.

use crate::cmodel::CollisionModel;
use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Area {
    pub num_area_portals: u32,
    pub first_area_portal: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaPortal {
    pub portal_num: u32,
    pub other_area: u32,
}

pub(crate) fn validate(areas: &[Area], portals: &[AreaPortal]) -> Result<(), ModelError> {
    for (i, a) in areas.iter().enumerate() {
        let first = a.first_area_portal as usize;
        let end = first + a.num_area_portals as usize;
        if end > portals.len() {
            return Err(ModelError::AreaPortals {
                area: i,
                first,
                end,
                count: portals.len(),
            });
        }
    }
    for (i, p) in portals.iter().enumerate() {
        if p.other_area as usize >= areas.len() {
            return Err(ModelError::PortalArea {
                index: i,
                other: p.other_area as usize,
                count: areas.len(),
            });
        }
    }
    Ok(())
}

impl CollisionModel {
    pub fn num_areas(&self) -> usize {
        self.areas.len()
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn area_portals(&self) -> &[AreaPortal] {
        &self.area_portals
    }
}

/// Open/closed flags for every area portal plus the flood numbering derived
/// from them. Two areas with the same flood number are connected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortalState {
    /// `(portal_num, other_area)` per area
    links: Vec<Vec<(u32, u32)>>,
    portal_open: Vec<bool>,
    flood_num: Vec<i32>,
    flood_valid: Vec<u32>,
    flood_generation: u32,
    /// map has no area table, everything is connected
    no_areas: bool,
}

impl PortalState {
    /// All portals closed, connections flooded.
    pub fn new(model: &CollisionModel) -> Self {
        let links: Vec<Vec<(u32, u32)>> = model
            .areas
            .iter()
            .map(|a| {
                let first = a.first_area_portal as usize;
                model.area_portals[first..first + a.num_area_portals as usize]
                    .iter()
                    .map(|p| (p.portal_num, p.other_area))
                    .collect()
            })
            .collect();
        let num_portals = model
            .area_portals
            .iter()
            .map(|p| p.portal_num as usize + 1)
            .max()
            .unwrap_or(0);

        let mut state = Self {
            portal_open: vec![false; num_portals],
            flood_num: vec![0; links.len()],
            flood_valid: vec![0; links.len()],
            flood_generation: 0,
            no_areas: links.is_empty(),
            links,
        };
        state.flood_area_connections();
        state
    }

    pub fn num_portals(&self) -> usize {
        self.portal_open.len()
    }

    pub fn portal_open(&self, portalnum: usize) -> bool {
        self.portal_open[portalnum]
    }

    fn flood_area_r(&mut self, area: usize, floodnum: i32) {
        if self.flood_valid[area] == self.flood_generation {
            if self.flood_num[area] == floodnum {
                return;
            }
            panic!("flood_area_r: reflooded area {}", area);
        }

        self.flood_num[area] = floodnum;
        self.flood_valid[area] = self.flood_generation;

        for i in 0..self.links[area].len() {
            let (portal, other) = self.links[area][i];
            if self.portal_open[portal as usize] {
                self.flood_area_r(other as usize, floodnum);
            }
        }
    }

    /// Renumber connected groups. Area 0 is the outside void and is never
    /// flooded.
    pub fn flood_area_connections(&mut self) {
        self.flood_generation = self.flood_generation.wrapping_add(1);
        if self.flood_generation == 0 {
            self.flood_valid.fill(0);
            self.flood_generation = 1;
        }
        let mut floodnum = 0;

        for area in 1..self.links.len() {
            if self.flood_valid[area] == self.flood_generation {
                continue;
            }
            floodnum += 1;
            self.flood_area_r(area, floodnum);
        }
    }

    pub fn set_portal_state(&mut self, portalnum: usize, open: bool) {
        if portalnum >= self.portal_open.len() {
            panic!("set_portal_state: areaportal {} > numareaportals {}", portalnum, self.portal_open.len());
        }
        self.portal_open[portalnum] = open;
        self.flood_area_connections();
    }

    pub fn areas_connected(&self, area1: usize, area2: usize) -> bool {
        if self.no_areas {
            return true;
        }
        if area1 >= self.links.len() || area2 >= self.links.len() {
            panic!("areas_connected: area > numareas");
        }
        self.flood_num[area1] == self.flood_num[area2]
    }

    /// Bit vector of the areas connected to `area`, written into `buffer`.
    /// Area 0 and maps without areas mark everything. Returns the number of
    /// bytes the vector occupies.
    pub fn write_area_bits(&self, buffer: &mut [u8], area: usize) -> usize {
        let num_areas = self.links.len();
        let bytes = (num_areas + 7) >> 3;

        if self.no_areas {
            buffer[..bytes].fill(0xff);
            return bytes;
        }

        buffer[..bytes].fill(0);
        let floodnum = self.flood_num[area];
        for i in 0..num_areas {
            if self.flood_num[i] == floodnum || area == 0 {
                buffer[i >> 3] |= 1 << (i & 7);
            }
        }
        bytes
    }

    /// Save the open flags, one byte per portal.
    pub fn write_portal_state(&self, writer: &mut dyn std::io::Write) -> std::io::Result<()> {
        let bytes: Vec<u8> = self.portal_open.iter().map(|&open| open as u8).collect();
        writer.write_all(&bytes)
    }

    /// Restore flags written by [`PortalState::write_portal_state`] and
    /// reflood.
    pub fn read_portal_state(&mut self, reader: &mut dyn std::io::Read) -> std::io::Result<()> {
        let mut bytes = vec![0u8; self.portal_open.len()];
        reader.read_exact(&mut bytes)?;
        for (open, &b) in self.portal_open.iter_mut().zip(&bytes) {
            *open = b != 0;
        }
        self.flood_area_connections();
        Ok(())
    }
}
