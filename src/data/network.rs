//! Node-link structure sent to the backend for force-directed layout.

use rand::Rng;

/// Number of random sample links requested by default.
pub const DEFAULT_SAMPLE_LINKS: usize = 50;

pub type Link = [usize; 2];

/// Nodes `0..n` and the links between them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkSpec {
    pub nodes: Vec<usize>,
    pub links: Vec<Link>,
}

impl NetworkSpec {
    /// One node per point and `link_count` links with uniformly random endpoints.
    pub fn sampled<R: Rng + ?Sized>(rng: &mut R, point_count: usize, link_count: usize) -> Self {
        let nodes = (0..point_count).collect();
        let links = if point_count == 0 {
            Vec::new()
        } else {
            (0..link_count)
                .map(|_| {
                    [
                        rng.random_range(0..point_count),
                        rng.random_range(0..point_count),
                    ]
                })
                .collect()
        };
        Self { nodes, links }
    }
}
