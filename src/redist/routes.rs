/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The table of redistribution routes.
//!
//! Each supported (source, destination) pair maps to a short sequence of
//! steps, each implemented by one communication shape.  Pairs without a
//! direct step are composed from direct steps through the cheapest chain of
//! intermediate distributions.  The table depends only on whether the grid
//! is square, and is computed once for each case.

use gridmat_grid::{Pair, Scope};

use std::collections::HashMap;
use std::fmt;

/// How one step of a route moves data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Nothing moves; compatible descriptors.
    LocalCopy,
    /// Every process keeps a subset of what it has.
    Filter,
    /// A permutation of processes: everyone sends to one partner and
    /// receives from one partner.
    Exchange,
    /// Members of the scope hold disjoint pieces, and everybody needs all of them.
    AllGather(Scope),
    /// Personalized exchange within the scope.
    AllToAll(Scope),
    /// Everything goes to the root of a `[CIRC,CIRC]` destination.
    Gather,
    /// The root of a `[CIRC,CIRC]` source hands out pieces.
    Scatter,
    /// The root of a `[CIRC,CIRC]` source sends everything to everybody.
    Broadcast,
}

impl Shape {
    fn cost(self) -> usize
    {
        match self {
            Shape::LocalCopy | Shape::Filter => 0,
            Shape::Exchange => 2,
            Shape::AllToAll(_) => 3,
            Shape::AllGather(Scope::Vc) | Shape::AllGather(Scope::Vr) => 5,
            Shape::AllGather(_) => 4,
            Shape::Gather | Shape::Scatter | Shape::Broadcast => 6,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Step {
    pub from: Pair,
    pub to: Pair,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub steps: Vec<Step>,
    /// Whether this is the fallback that funnels everything through one process.
    pub general_purpose: bool,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        for (index, step) in self.steps.iter().enumerate() {
            if index == 0 {
                write!(f, "{}", step.from)?;
            }
            write!(f, " -{:?}-> {}", step.shape, step.to)?;
        }
        Ok(())
    }
}

/// The route from one pair to another on a square or non-square grid.
pub fn route(from: Pair, to: Pair, square: bool) -> &'static Route
{
    let table: &'static HashMap<(Pair, Pair), Route> = match square {
        true => &SQUARE,
        false => &RECTANGULAR,
    };
    &table[&(from, to)]
}

lazy_static! {
    static ref SQUARE: HashMap<(Pair, Pair), Route> = build_table(true);
    static ref RECTANGULAR: HashMap<(Pair, Pair), Route> = build_table(false);
}

/// The single-step shape for a pair, if there is one.
pub fn direct(from: Pair, to: Pair, square: bool) -> Option<Shape>
{
    use gridmat_grid::Pair as P;

    if from == to {
        return Some(Shape::LocalCopy);
    }
    if to == P::CIRC_CIRC {
        return Some(Shape::Gather);
    }
    if from == P::CIRC_CIRC {
        return Some(match to {
            P::STAR_STAR => Shape::Broadcast,
            _ => Shape::Scatter,
        });
    }
    if from == P::STAR_STAR {
        return Some(Shape::Filter);
    }
    if to == P::STAR_STAR {
        return Some(Shape::AllGather(match from {
            P::MC_STAR | P::STAR_MC => Scope::Mc,
            P::MR_STAR | P::STAR_MR => Scope::Mr,
            _ => Scope::Vc,
        }));
    }
    Some(match (from, to) {
        (P::MC_STAR, P::MC_MR) | (P::STAR_MR, P::MC_MR) |
        (P::MR_STAR, P::MR_MC) | (P::STAR_MC, P::MR_MC) |
        (P::MC_STAR, P::VC_STAR) | (P::MR_STAR, P::VR_STAR) |
        (P::STAR_MC, P::STAR_VC) | (P::STAR_MR, P::STAR_VR) => Shape::Filter,

        (P::MC_MR, P::MC_STAR) | (P::MR_MC, P::STAR_MC) |
        (P::VC_STAR, P::MC_STAR) | (P::STAR_VC, P::STAR_MC) => Shape::AllGather(Scope::Mr),

        (P::MC_MR, P::STAR_MR) | (P::MR_MC, P::MR_STAR) |
        (P::VR_STAR, P::MR_STAR) | (P::STAR_VR, P::STAR_MR) => Shape::AllGather(Scope::Mc),

        (P::VC_STAR, P::MC_MR) | (P::MC_MR, P::VC_STAR) |
        (P::STAR_VC, P::MR_MC) | (P::MR_MC, P::STAR_VC) => Shape::AllToAll(Scope::Mr),

        (P::STAR_VR, P::MC_MR) | (P::MC_MR, P::STAR_VR) |
        (P::VR_STAR, P::MR_MC) | (P::MR_MC, P::VR_STAR) => Shape::AllToAll(Scope::Mc),

        (P::VC_STAR, P::VR_STAR) | (P::VR_STAR, P::VC_STAR) |
        (P::STAR_VC, P::STAR_VR) | (P::STAR_VR, P::STAR_VC) => Shape::Exchange,

        (P::MC_MR, P::MR_MC) | (P::MR_MC, P::MC_MR) if square => Shape::Exchange,

        _ => return None,
    })
}

// may appear in the middle of a composed route
fn is_intermediate(pair: Pair) -> bool
{
    match pair {
        Pair::STAR_STAR | Pair::CIRC_CIRC | Pair::MD_STAR | Pair::STAR_MD => false,
        _ => true,
    }
}

fn step_weight(shape: Shape) -> usize
{ 10 * shape.cost() + 1 }

fn build_table(square: bool) -> HashMap<(Pair, Pair), Route>
{
    let mut table = HashMap::new();
    for &from in &Pair::ALL {
        for &to in &Pair::ALL {
            let route = match direct(from, to, square) {
                Some(shape) => Route { steps: vec![Step { from, to, shape }], general_purpose: false },
                None => match cheapest_chain(from, to, square) {
                    Some(steps) => Route { steps, general_purpose: false },
                    None => general_purpose(from, to),
                },
            };
            table.insert((from, to), route);
        }
    }
    table
}

/// Dijkstra over the direct steps.
fn cheapest_chain(from: Pair, to: Pair, square: bool) -> Option<Vec<Step>>
{
    let nodes = &Pair::ALL;
    let index = |pair: Pair| nodes.iter().position(|&p| p == pair);
    let (start, goal) = (index(from)?, index(to)?);

    let mut dist = vec![None::<usize>; nodes.len()];
    let mut prev = vec![None::<(usize, Shape)>; nodes.len()];
    let mut done = vec![false; nodes.len()];
    dist[start] = Some(0);

    loop {
        // ties go to the earlier pair in the list, which keeps the table stable
        let current = (0..nodes.len())
            .filter(|&n| !done[n])
            .filter_map(|n| dist[n].map(|d| (d, n)))
            .min()
            .map(|(_, n)| n);
        let current = match current {
            Some(n) => n,
            None => break,
        };
        done[current] = true;
        if current == goal {
            break;
        }
        if current != start && !is_intermediate(nodes[current]) {
            continue;
        }
        let base = dist[current].unwrap_or(0);
        for next in 0..nodes.len() {
            if next == current || done[next] {
                continue;
            }
            if let Some(shape) = direct(nodes[current], nodes[next], square) {
                let candidate = base + step_weight(shape);
                if dist[next].map_or(true, |d| candidate < d) {
                    dist[next] = Some(candidate);
                    prev[next] = Some((current, shape));
                }
            }
        }
    }

    dist[goal]?;
    let mut steps = vec![];
    let mut at = goal;
    while let Some((before, shape)) = prev[at] {
        steps.push(Step { from: nodes[before], to: nodes[at], shape });
        at = before;
    }
    steps.reverse();
    Some(steps)
}

fn general_purpose(from: Pair, to: Pair) -> Route
{
    Route {
        steps: vec![
            Step { from, to: Pair::CIRC_CIRC, shape: Shape::Gather },
            Step { from: Pair::CIRC_CIRC, to, shape: Shape::Scatter },
        ],
        general_purpose: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes(route: &Route) -> Vec<Shape>
    { route.steps.iter().map(|s| s.shape).collect() }

    #[test]
    fn every_pair_has_a_connected_route() {
        for &square in &[true, false] {
            for &from in &Pair::ALL {
                for &to in &Pair::ALL {
                    let route = route(from, to, square);
                    assert!(!route.steps.is_empty());
                    assert_eq!(route.steps[0].from, from);
                    assert_eq!(route.steps.last().unwrap().to, to);
                    for pair in route.steps.windows(2) {
                        assert_eq!(pair[0].to, pair[1].from, "{}", route);
                    }
                }
            }
        }
    }

    #[test]
    fn direct_routes() {
        assert_eq!(shapes(route(Pair::VC_STAR, Pair::STAR_STAR, false)), vec![Shape::AllGather(Scope::Vc)]);
        assert_eq!(shapes(route(Pair::MC_STAR, Pair::STAR_STAR, false)), vec![Shape::AllGather(Scope::Mc)]);
        assert_eq!(shapes(route(Pair::STAR_STAR, Pair::MD_STAR, false)), vec![Shape::Filter]);
        assert_eq!(shapes(route(Pair::CIRC_CIRC, Pair::STAR_STAR, false)), vec![Shape::Broadcast]);
        assert_eq!(shapes(route(Pair::MC_MR, Pair::MC_MR, false)), vec![Shape::LocalCopy]);
    }

    #[test]
    fn transposition_depends_on_squareness() {
        assert_eq!(shapes(route(Pair::MC_MR, Pair::MR_MC, true)), vec![Shape::Exchange]);

        let rect = route(Pair::MC_MR, Pair::MR_MC, false);
        assert!(rect.steps.len() > 1);
        assert!(!rect.general_purpose);
    }

    #[test]
    fn composed_routes_avoid_replication() {
        // through [VC,STAR]/[VR,STAR] rather than gathering everything
        let route = route(Pair::MC_MR, Pair::VR_STAR, false);
        assert_eq!(shapes(route), vec![Shape::AllToAll(Scope::Mr), Shape::Exchange]);
        for step in &route.steps[..route.steps.len() - 1] {
            assert!(is_intermediate(step.to));
        }
    }

    #[test]
    fn general_purpose_only_for_diagonal_pairs() {
        for &square in &[true, false] {
            for &from in &Pair::ALL {
                for &to in &Pair::ALL {
                    let route = route(from, to, square);
                    if route.general_purpose {
                        let diagonal = |p: Pair| p == Pair::MD_STAR || p == Pair::STAR_MD;
                        assert!(diagonal(from) || diagonal(to), "{}", route);
                    }
                }
            }
        }
        assert!(route(Pair::MD_STAR, Pair::STAR_MD, false).general_purpose);
    }
}
