use super::RegionScanner;
use crate::models::PixelLoc;
use crate::models::region::PointFlow;

/// Neighbour offsets by octant, counter-clockwise from the lower left
pub(crate) const PATTERN_X: [i32; 8] = [-1, 0, 1, 1, 1, 0, -1, -1];
pub(crate) const PATTERN_Y: [i32; 8] = [-1, -1, -1, 0, 1, 1, 1, 0];

const COEFFICIENT: [i32; 8] = [0, 1, 2, 1, 0, -1, -2, -1];

/// Neighbour of `loc` in octant `dir`
pub(crate) fn neighbor(loc: PixelLoc, dir: u8) -> PixelLoc {
    let d = dir as usize & 7;
    loc.translate(PATTERN_X[d], PATTERN_Y[d])
}

impl RegionScanner<'_> {
    /// Sobel-like response at `loc` in four compass directions; the strongest wins.
    ///
    /// Returns the blank flow if any neighbour lies outside the image.
    pub(crate) fn get_point_flow(&self, plane: usize, loc: PixelLoc, arrive: Option<u8>) -> PointFlow {
        let mut pattern = [0i32; 8];
        for (i, value) in pattern.iter_mut().enumerate() {
            match self.pixel(loc.x + PATTERN_X[i], loc.y + PATTERN_Y[i], plane) {
                Some(v) => *value = v,
                None => return PointFlow::BLANK,
            }
        }

        let mut mag = [0i32; 4];
        let mut compass_max = 0;
        for compass in 0..4 {
            mag[compass] = (0..8)
                .map(|i| COEFFICIENT[(i + 8 - compass) % 8] * pattern[i])
                .sum();
            if compass != 0 && mag[compass].abs() > mag[compass_max].abs() {
                compass_max = compass;
            }
        }

        PointFlow {
            plane,
            arrive,
            depart: if mag[compass_max] > 0 {
                compass_max as u8 + 4
            } else {
                compass_max as u8
            },
            mag: mag[compass_max].abs(),
            loc,
        }
    }

    /// Strongest unvisited neighbour of `center` roughly along the edge.
    ///
    /// `sign` picks which way along the edge to travel. Gives up (blank flow) once a third
    /// visited neighbour is seen.
    pub(crate) fn find_strongest_neighbor(&self, center: &PointFlow, sign: i32) -> PointFlow {
        let attempt = if sign < 0 {
            center.depart as i32
        } else {
            (center.depart as i32 + 4) % 8
        };

        let mut occupied = 0;
        let mut best: Option<PointFlow> = None;
        for i in 0..8u8 {
            let loc = neighbor(center.loc, i);
            let Some(cell) = self.cache.get(loc) else {
                continue;
            };
            if cell.visited {
                occupied += 1;
                if occupied > 2 {
                    return PointFlow::BLANK;
                }
                continue;
            }

            let mut attempt_diff = (attempt - i as i32).abs();
            if attempt_diff > 4 {
                attempt_diff = 8 - attempt_diff;
            }
            if attempt_diff > 1 {
                continue;
            }

            let flow = self.get_point_flow(center.plane, loc, Some(i));
            let take = match &best {
                None => true,
                Some(b) => flow.mag > b.mag || (flow.mag == b.mag && i & 1 != 0),
            };
            if take {
                best = Some(flow);
            }
        }

        best.unwrap_or(PointFlow::BLANK)
    }

    /// Strongest edge at a seed pixel over all planes, kept only if the trail can be followed
    /// one step both ways and back.
    pub(crate) fn seek_edge(&self, loc: PixelLoc) -> PointFlow {
        let mut flow = PointFlow::BLANK;
        for plane in 0..self.channel_count().min(3) {
            let candidate = self.get_point_flow(plane, loc, None);
            if plane == 0 || candidate.mag > flow.mag {
                flow = candidate;
            }
        }

        if flow.mag < 10 {
            return PointFlow::BLANK;
        }

        let flow_pos = self.find_strongest_neighbor(&flow, 1);
        let flow_neg = self.find_strongest_neighbor(&flow, -1);
        if flow_pos.mag > 0 && flow_neg.mag > 0 {
            let flow_pos_back = self.find_strongest_neighbor(&flow_pos, -1);
            let flow_neg_back = self.find_strongest_neighbor(&flow_neg, 1);
            let reverse = |f: &PointFlow| f.arrive.map(|a| (a + 4) % 8);
            if flow_pos.arrive.is_some()
                && flow_pos.arrive == reverse(&flow_pos_back)
                && flow_neg.arrive == reverse(&flow_neg_back)
            {
                flow.arrive = None;
                return flow;
            }
        }

        PointFlow::BLANK
    }
}
