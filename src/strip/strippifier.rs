//! Greedy triangle-strip growth over a [`MeshGraph`].
//!
//! Based on the strip-growth approach of David Kronmann: pick the unused
//! triangle with the fewest free neighbours, grow a strip along shared edges
//! while the cull winding stays continuous, and attempt one reversal from the
//! starting triangle before sealing the strip. Triangles with no free
//! neighbours are emitted as standalone three-index strips.

use tracing::debug;

use crate::error::Result;
use crate::strip::graph::MeshGraph;

/// One triangle strip: parallel vertex/normal/uv index streams.
///
/// The vertex order carries the engine's flipped cull convention; expanding
/// the strip with alternating winding yields every source triangle exactly
/// once, front-facing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strip {
    pub vertices: Vec<usize>,
    pub normals: Vec<usize>,
    pub uvs: Option<Vec<usize>>,
}

impl Strip {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Convert a triangle list (plus an optional parallel per-corner UV index
/// list) into triangle strips covering every triangle exactly once.
pub fn strippify(
    indices: &[usize],
    uv_indices: Option<&[usize]>,
    strict: bool,
) -> Result<Vec<Strip>> {
    let graph = MeshGraph::build(indices, uv_indices, strict)?;
    let strips = Stripper::new(graph, uv_indices.is_some()).run();
    debug!(
        triangles = indices.len() / 3,
        strips = strips.len(),
        "stripification complete"
    );
    Ok(strips)
}

struct Stripper {
    graph: MeshGraph,
    written: usize,
    strips: Vec<Strip>,
    has_uvs: bool,
}

impl Stripper {
    fn new(graph: MeshGraph, has_uvs: bool) -> Self {
        Self {
            graph,
            written: 0,
            strips: Vec::new(),
            has_uvs,
        }
    }

    fn normal_of(&self, vertex: usize) -> usize {
        self.graph.vertices[vertex].normal_index
    }

    /// UV index of a triangle corner. The graph guarantees the vertex belongs
    /// to the triangle whenever UVs are present.
    fn corner_uv(&self, tri: usize, vertex: usize) -> usize {
        self.graph.triangles[tri]
            .uv_at(vertex)
            .expect("uv present for triangle corner")
    }

    /// Emit a triangle with no free neighbours as its own 3-index strip,
    /// winding-flipped like every other strip.
    fn add_z_triangle(&mut self, tri: usize) {
        let v = self.graph.triangles[tri].vertices;
        let order = [v[0], v[2], v[1]];
        let strip = Strip {
            vertices: order.to_vec(),
            normals: order.iter().map(|&x| self.normal_of(x)).collect(),
            uvs: self
                .has_uvs
                .then(|| order.iter().map(|&x| self.corner_uv(tri, x)).collect()),
        };
        self.strips.push(strip);
        self.written += 1;
        self.graph.triangles[tri].used = true;
    }

    /// Scan for the next strip seed: the unused triangle with the fewest
    /// free neighbours. Neighbourless triangles encountered along the way are
    /// emitted immediately as Z-triangles (this advances the written count,
    /// which is why the outer loop re-checks termination after every scan).
    fn first_tri(&mut self) -> Option<usize> {
        let mut result = None;
        let mut lowest = usize::MAX;

        for tri in 0..self.graph.triangles.len() {
            if self.graph.triangles[tri].used {
                continue;
            }
            let n = self.graph.available_neighbours(tri).len();
            if n == 0 {
                self.add_z_triangle(tri);
                continue;
            }
            if n < lowest {
                if n == 1 {
                    return Some(tri);
                }
                lowest = n;
                result = Some(tri);
            }
        }

        result
    }

    /// Weighted neighbour selection for the first triangles of a strip.
    ///
    /// Favors candidates with fewer free neighbours (finish dead ends first)
    /// and higher shared-vertex connectivity. With an established base the
    /// candidate containing the current vertex wins ties. First-found wins
    /// otherwise; enumeration order is part of the output contract.
    fn next_strip_tri(&self, tri: usize, base: Option<(usize, usize)>) -> Option<usize> {
        let candidates = self.graph.available_neighbours(tri);
        if candidates.is_empty() {
            return None;
        }
        if candidates.len() == 1 {
            return Some(candidates[0]);
        }

        let mut weights = vec![0i32; candidates.len()];
        let mut connection = vec![0i32; candidates.len()];
        let mut biggest = 0i32;

        for (i, &t) in candidates.iter().enumerate() {
            weights[i] = self.graph.available_neighbours(t).len() as i32;
            if weights[i] == 0 {
                return Some(t);
            }

            match base {
                Some((prev, cur)) => {
                    // A candidate missing the current vertex forces a swap.
                    if self.graph.triangles[t].has_vertex(cur) {
                        weights[i] -= 1;
                        connection[i] = self.graph.available_tris(prev) as i32;
                    } else {
                        weights[i] += 1;
                        connection[i] = self.graph.available_tris(cur) as i32;
                    }
                }
                None => {
                    let edge = self
                        .graph
                        .shared_edge(tri, t)
                        .expect("neighbouring triangles share an edge");
                    let (a, b) = self.graph.edges[edge].vertices;
                    connection[i] = self.graph.available_tris(a) as i32
                        + self.graph.available_tris(b) as i32
                        - 2;
                }
            }

            if connection[i] > biggest {
                biggest = connection[i];
            }
        }

        for i in 0..candidates.len() {
            if connection[i] < biggest {
                weights[i] -= 1;
            } else {
                weights[i] += 1;
            }
        }

        let mut index = 0;
        for i in 1..candidates.len() {
            let ties_toward_cur = match base {
                Some((_, cur)) => {
                    weights[i] == weights[index]
                        && self.graph.triangles[candidates[i]].has_vertex(cur)
                }
                None => false,
            };
            if weights[i] < weights[index] || ties_toward_cur {
                index = i;
            }
        }

        Some(candidates[index])
    }

    /// Shared-edge continuation once a strip is running: the unused triangle
    /// on the other side of the (prev, cur) edge.
    fn next_strip_tri_seq(&self, tri: usize, prev: usize, cur: usize) -> Option<usize> {
        let edge = self.graph.edge_between(prev, cur)?;
        self.graph.edges[edge]
            .triangles
            .iter()
            .copied()
            .find(|&t| t != tri && !self.graph.triangles[t].used)
    }

    /// Whether two adjacent triangles wind against each other: the shared
    /// vertices appear in the same relative rotation in both, so a strip
    /// crossing the edge would flip one of them backwards.
    fn broken_cull_flow(&self, tri_a: usize, tri_b: usize) -> bool {
        let a = &self.graph.triangles[tri_a];
        let b = &self.graph.triangles[tri_b];
        for (i, v) in a.vertices.iter().enumerate() {
            if let Some(j) = b.vertices.iter().position(|x| x == v) {
                return b.vertices[(j + 2) % 3] == a.vertices[(i + 2) % 3];
            }
        }
        false
    }

    fn run(mut self) -> Vec<Strip> {
        let tri_count = self.graph.triangles.len();
        let mut first_tri = self.first_tri();

        while self.written != tri_count {
            let Some(first) = first_tri else {
                break;
            };

            // Determine the first (up to) three triangles of the strip.
            let current_tri = first;
            self.graph.triangles[current_tri].used = true;

            let Some(new_tri) = self.next_strip_tri(current_tri, None) else {
                self.graph.triangles[current_tri].used = false;
                self.add_z_triangle(current_tri);
                first_tri = self.first_tri();
                continue;
            };

            // A strip cannot cross a winding break; emit the seed alone.
            if self.broken_cull_flow(current_tri, new_tri) {
                self.add_z_triangle(current_tri);
                first_tri = self.first_tri();
                continue;
            }

            let shared = self
                .graph
                .shared_edge(current_tri, new_tri)
                .expect("neighbouring triangles share an edge");
            let (shared_a, shared_b) = self.graph.edges[shared].vertices;
            self.graph.triangles[new_tri].used = true;

            // Starting vertex: the one not on the shared edge.
            let prev_vert = self.graph.triangles[current_tri]
                .third_vertex(shared_a, shared_b)
                .expect("shared edge lies on the triangle");

            // Look one triangle further to orient the strip base so the next
            // extension does not need a swap.
            let sec_new_tri = self.next_strip_tri(new_tri, None);

            let Some(sec_new_tri) = sec_new_tri else {
                // No third triangle: the second one had a single neighbour,
                // which means the whole strip is just these two.
                let current_vert = shared_b;
                let next_vert = shared_a;
                let third_vert = self.graph.triangles[new_tri]
                    .third_vertex(current_vert, next_vert)
                    .expect("shared edge lies on the triangle");

                let vertices = vec![prev_vert, current_vert, next_vert, third_vert];
                let normals = vertices.iter().map(|&x| self.normal_of(x)).collect();
                let uvs = self.has_uvs.then(|| {
                    vec![
                        self.corner_uv(current_tri, prev_vert),
                        self.corner_uv(current_tri, current_vert),
                        self.corner_uv(current_tri, next_vert),
                        self.corner_uv(new_tri, third_vert),
                    ]
                });
                self.strips.push(Strip {
                    vertices,
                    normals,
                    uvs,
                });
                self.written += 2;
                first_tri = self.first_tri();
                continue;
            };

            let (current_vert, next_vert) = if self.graph.triangles[sec_new_tri].has_vertex(shared_a)
            {
                (shared_b, shared_a)
            } else {
                (shared_a, shared_b)
            };

            // Strip base.
            let mut vertices = vec![prev_vert, current_vert, next_vert];
            let mut normals: Vec<usize> = vertices.iter().map(|&x| self.normal_of(x)).collect();
            let mut uvs = self.has_uvs.then(|| {
                vec![
                    self.corner_uv(current_tri, prev_vert),
                    self.corner_uv(current_tri, current_vert),
                    self.corner_uv(current_tri, next_vert),
                ]
            });
            self.written += 1;

            // Shift vertices two forward, triangles one forward.
            let mut prev_vert = next_vert;
            let mut current_vert = self.graph.triangles[new_tri]
                .third_vertex(current_vert, next_vert)
                .expect("base vertices lie on the second triangle");

            let mut first_tri_id = first;
            let mut current_tri = new_tri;
            let mut new_tri = if self.broken_cull_flow(current_tri, sec_new_tri) {
                None
            } else {
                Some(sec_new_tri)
            };

            let mut reached_end = false;
            let mut reversed = false;
            while !reached_end {
                vertices.push(current_vert);
                normals.push(self.normal_of(current_vert));
                if let Some(u) = uvs.as_mut() {
                    u.push(self.corner_uv(current_tri, current_vert));
                }
                self.written += 1;

                if new_tri.is_none() {
                    // End of the forward run: try extending backwards from
                    // the starting triangle, exactly once.
                    if !reversed && !self.graph.available_neighbours(first_tri_id).is_empty() {
                        reversed = true;
                        prev_vert = vertices[1];
                        current_vert = vertices[0];
                        new_tri = self.next_strip_tri_seq(first_tri_id, prev_vert, current_vert);
                        if new_tri.is_none() {
                            reached_end = true;
                            continue;
                        }
                        vertices.reverse();
                        normals.reverse();
                        if let Some(u) = uvs.as_mut() {
                            u.reverse();
                        }
                        std::mem::swap(&mut first_tri_id, &mut current_tri);
                    } else {
                        reached_end = true;
                        continue;
                    }
                }

                let Some(next_tri) = new_tri else {
                    break;
                };

                let Some(next_vert) = self.graph.triangles[next_tri]
                    .third_vertex(prev_vert, current_vert)
                else {
                    reached_end = true;
                    continue;
                };

                prev_vert = current_vert;
                current_vert = next_vert;

                let old_tri = current_tri;
                current_tri = next_tri;
                self.graph.triangles[current_tri].used = true;

                new_tri = if self.broken_cull_flow(old_tri, current_tri) {
                    None
                } else {
                    self.next_strip_tri_seq(current_tri, prev_vert, current_vert)
                };
            }

            // If the start triangle comes out reverse-wound, duplicate the
            // first index to restore the alternation.
            let ft_verts = self.graph.triangles[first_tri_id].vertices;
            for i in 0..3 {
                if vertices[i] == ft_verts[0] {
                    let next = if i == 2 { 0 } else { i + 1 };
                    if ft_verts[1] == vertices[next] {
                        vertices.insert(0, vertices[0]);
                        normals.insert(0, normals[0]);
                        if let Some(u) = uvs.as_mut() {
                            u.insert(0, u[0]);
                        }
                    }
                    break;
                }
            }

            self.strips.push(Strip {
                vertices,
                normals,
                uvs,
            });

            first_tri = self.first_tri();
        }

        self.strips
    }
}
