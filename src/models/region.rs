use super::point::PixelLoc;
use super::symbol::SymbolSize;
use crate::utils::geometry::Matrix3;

/// Gradient response at one pixel of one colour plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFlow {
    /// Colour plane the flow was measured in
    pub plane: usize,
    /// Octant the trail arrived from, if any
    pub arrive: Option<u8>,
    /// Octant pointing across the edge toward the brighter side
    pub depart: u8,
    /// Signed edge strength, -1 for the blank flow
    pub mag: i32,
    /// Pixel location (scaled coordinates)
    pub loc: PixelLoc,
}

impl PointFlow {
    /// Flow returned when no edge could be measured
    pub const BLANK: PointFlow = PointFlow {
        plane: 0,
        arrive: None,
        depart: 0,
        mag: -1,
        loc: PixelLoc { x: -1, y: -1 },
    };

    /// Whether this is the blank flow
    pub fn is_blank(&self) -> bool {
        self.mag == -1
    }
}

impl Default for PointFlow {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Straight edge fitted by Hough vote along a trail
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BestLine {
    /// Angle in degrees, 0..180
    pub angle: i32,
    /// Hough offset bin
    pub h_offset: i32,
    /// Vote count of the winning bin
    pub mag: i32,
    /// Trail step the fit started from
    pub step_beg: i32,
    /// Farthest positive step within the travel limits
    pub step_pos: i32,
    /// Farthest negative step within the travel limits
    pub step_neg: i32,
    /// Squared distance between the two travel limits
    pub dist_sq: i64,
    /// Largest perpendicular wander, in pixels
    pub devn: f64,
    /// Location at `step_beg`
    pub loc_beg: PixelLoc,
    /// Location at `step_pos`
    pub loc_pos: PixelLoc,
    /// Location at `step_neg`
    pub loc_neg: PixelLoc,
}

/// Candidate symbol location and everything learned about it during the search.
///
/// All locations are in scaled image coordinates. `raw2fit` maps them into the unit square
/// with the finder corner at the origin; `fit2raw` is its inverse.
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Number of trail steps in both directions combined
    pub steps_total: i32,
    /// Step at which the positive walk ended
    pub jump_to_pos: i32,
    /// Step at which the negative walk ended
    pub jump_to_neg: i32,
    /// Last location of the positive walk
    pub final_pos: PixelLoc,
    /// Last location of the negative walk
    pub final_neg: PixelLoc,
    /// Lower-left corner of the trail bounding box
    pub bound_min: PixelLoc,
    /// Upper-right corner of the trail bounding box
    pub bound_max: PixelLoc,
    /// Seed flow the trail was blazed from
    pub flow_begin: PointFlow,

    /// +1 for dark symbols on light background, -1 for inverse
    pub polarity: i32,
    /// Tentative location on the right calibration edge
    pub loc_r: PixelLoc,
    /// Trail step of `loc_r`
    pub step_r: i32,
    /// Tentative location on the top calibration edge
    pub loc_t: PixelLoc,
    /// Trail step of `loc_t`
    pub step_t: i32,

    /// Left finder edge has been located
    pub left_known: bool,
    /// Angle of the left edge in degrees
    pub left_angle: i32,
    /// A point on the left edge
    pub left_loc: PixelLoc,
    /// Fitted left finder line
    pub left_line: BestLine,
    /// Bottom finder edge has been located
    pub bottom_known: bool,
    /// Angle of the bottom edge in degrees
    pub bottom_angle: i32,
    /// A point on the bottom edge
    pub bottom_loc: PixelLoc,
    /// Fitted bottom finder line
    pub bottom_line: BestLine,
    /// Top calibration edge has been located
    pub top_known: bool,
    /// Angle of the top edge in degrees
    pub top_angle: i32,
    /// A point on the top edge
    pub top_loc: PixelLoc,
    /// Right calibration edge has been located
    pub right_known: bool,
    /// Angle of the right edge in degrees
    pub right_angle: i32,
    /// A point on the right edge
    pub right_loc: PixelLoc,

    /// Resolved symbol size
    pub size: Option<SymbolSize>,
    /// Average colour of on calibration modules
    pub on_color: i32,
    /// Average colour of off calibration modules
    pub off_color: i32,

    /// Image to fitted unit square
    pub raw2fit: Matrix3,
    /// Fitted unit square to image
    pub fit2raw: Matrix3,
}

impl Region {
    /// Symbol rows and columns, once the size is resolved
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.size.map(|s| (s.rows(), s.cols()))
    }
}
