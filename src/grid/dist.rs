/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{ConfigurationError, FailResult, GridShape};

use std::fmt;

/// How one dimension of a matrix is spread over the process grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dist {
    /// Cyclic over the processes of a grid column (i.e. over grid rows).
    Mc,
    /// Cyclic over the processes of a grid row (i.e. over grid columns).
    Mr,
    /// Cyclic over the processes of one diagonal path.
    Md,
    /// Cyclic over every process, in VC order.
    Vc,
    /// Cyclic over every process, in VR order.
    Vr,
    /// Replicated.
    Star,
    /// Held entirely by one process.
    Circ,
}

impl Dist {
    /// Number of distinct owners along this dimension.
    pub fn stride(self, shape: GridShape) -> usize
    {
        match self {
            Dist::Mc => shape.height,
            Dist::Mr => shape.width,
            Dist::Md => shape.lcm(),
            Dist::Vc | Dist::Vr => shape.size(),
            Dist::Star | Dist::Circ => 1,
        }
    }

    fn name(self) -> &'static str
    {
        match self {
            Dist::Mc => "MC",
            Dist::Mr => "MR",
            Dist::Md => "MD",
            Dist::Vc => "VC",
            Dist::Vr => "VR",
            Dist::Star => "STAR",
            Dist::Circ => "CIRC",
        }
    }
}

impl fmt::Display for Dist {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    { f.write_str(self.name()) }
}

/// The distributions of the two dimensions of a matrix.
///
/// `col` distributes the row indices (it says how a single *column* is
/// spread), and `row` distributes the column indices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    pub col: Dist,
    pub row: Dist,
}

macro_rules! pair {
    ($col:ident, $row:ident) => { Pair { col: Dist::$col, row: Dist::$row } };
}

impl Pair {
    pub const MC_MR: Pair = pair!(Mc, Mr);
    pub const MC_STAR: Pair = pair!(Mc, Star);
    pub const STAR_MR: Pair = pair!(Star, Mr);
    pub const MR_MC: Pair = pair!(Mr, Mc);
    pub const MR_STAR: Pair = pair!(Mr, Star);
    pub const STAR_MC: Pair = pair!(Star, Mc);
    pub const VC_STAR: Pair = pair!(Vc, Star);
    pub const STAR_VC: Pair = pair!(Star, Vc);
    pub const VR_STAR: Pair = pair!(Vr, Star);
    pub const STAR_VR: Pair = pair!(Star, Vr);
    pub const MD_STAR: Pair = pair!(Md, Star);
    pub const STAR_MD: Pair = pair!(Star, Md);
    pub const STAR_STAR: Pair = pair!(Star, Star);
    pub const CIRC_CIRC: Pair = pair!(Circ, Circ);

    /// Every supported pair.
    pub const ALL: [Pair; 14] = [
        Pair::MC_MR, Pair::MC_STAR, Pair::STAR_MR,
        Pair::MR_MC, Pair::MR_STAR, Pair::STAR_MC,
        Pair::VC_STAR, Pair::STAR_VC, Pair::VR_STAR, Pair::STAR_VR,
        Pair::MD_STAR, Pair::STAR_MD,
        Pair::STAR_STAR, Pair::CIRC_CIRC,
    ];

    pub fn new(col: Dist, row: Dist) -> FailResult<Pair>
    {Ok({
        let pair = Pair { col, row };
        if !pair.is_supported() {
            throw!(ConfigurationError::new(format!("{} is not a supported distribution", pair)));
        }
        pair
    })}

    pub fn is_supported(self) -> bool
    { Pair::ALL.contains(&self) }

    pub fn transpose(self) -> Pair
    { Pair { col: self.row, row: self.col } }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    { write!(f, "[{},{}]", self.col, self.row) }
}
