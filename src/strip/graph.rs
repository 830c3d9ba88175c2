//! Topology graph over a triangle index buffer.
//!
//! Vertices, edges, and triangles live in one arena; all cross-references are
//! indices into the arena's parallel vectors, so the mutual
//! vertex↔edge↔triangle adjacency never forms ownership cycles.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{GnoError, Result};

/// A single point in the graph.
#[derive(Debug)]
pub struct Vertex {
    pub index: usize,
    /// Index into the normal buffer; parallels the vertex index.
    pub normal_index: usize,
    /// Triangles this vertex is part of, in construction order.
    pub triangles: Vec<usize>,
}

/// An adjacency between two vertices. The vertex pair keeps creation order;
/// the strip-growth heuristics depend on it.
#[derive(Debug)]
pub struct Edge {
    pub vertices: (usize, usize),
    /// Incident triangles: 1 on a boundary, 2 inside a manifold surface.
    pub triangles: Vec<usize>,
}

/// One triangle of the index buffer, winding-ordered.
#[derive(Debug)]
pub struct Triangle {
    pub vertices: [usize; 3],
    pub edges: Vec<usize>,
    /// Triangles sharing an edge, in attachment order.
    pub neighbours: Vec<usize>,
    /// Consumed into a strip.
    pub used: bool,
    /// Per-corner UV indices, parallel to `vertices`.
    pub uvs: Option<[usize; 3]>,
}

impl Triangle {
    pub fn has_vertex(&self, v: usize) -> bool {
        self.vertices.contains(&v)
    }

    /// UV index at the given vertex; the vertex must belong to the triangle.
    pub fn uv_at(&self, v: usize) -> Option<usize> {
        let uvs = self.uvs.as_ref()?;
        let corner = self.vertices.iter().position(|&x| x == v)?;
        Some(uvs[corner])
    }

    /// The vertex that is neither `v1` nor `v2`.
    pub fn third_vertex(&self, v1: usize, v2: usize) -> Option<usize> {
        if !self.has_vertex(v1) || !self.has_vertex(v2) {
            return None;
        }
        self.vertices.iter().copied().find(|&v| v != v1 && v != v2)
    }
}

/// Owned arena of one index buffer's topology.
#[derive(Debug, Default)]
pub struct MeshGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub triangles: Vec<Triangle>,
    edge_lookup: HashMap<(usize, usize), usize>,
}

impl MeshGraph {
    /// Build the graph from a flat triangle list plus an optional parallel
    /// per-corner UV index list.
    ///
    /// In strict mode an edge gaining a third incident triangle is a fatal
    /// topology error; otherwise such edges are counted and reported.
    pub fn build(indices: &[usize], uv_indices: Option<&[usize]>, strict: bool) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(GnoError::Topology(format!(
                "index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(uvs) = uv_indices {
            if uvs.len() != indices.len() {
                return Err(GnoError::Topology(format!(
                    "uv index buffer length {} does not match index buffer length {}",
                    uvs.len(),
                    indices.len()
                )));
            }
        }

        let mut graph = MeshGraph::default();
        if indices.is_empty() {
            return Ok(graph);
        }

        let vertex_count = indices.iter().copied().max().unwrap_or(0) + 1;
        graph.vertices = (0..vertex_count)
            .map(|index| Vertex {
                index,
                normal_index: index,
                triangles: Vec::new(),
            })
            .collect();

        for t in 0..indices.len() / 3 {
            let verts = [indices[t * 3], indices[t * 3 + 1], indices[t * 3 + 2]];
            let uvs = uv_indices.map(|u| [u[t * 3], u[t * 3 + 1], u[t * 3 + 2]]);
            graph.add_triangle(verts, uvs, strict)?;
        }

        if !strict {
            let overshared = graph
                .edges
                .iter()
                .filter(|e| e.triangles.len() > 2)
                .count();
            if overshared > 0 {
                warn!(edges = overshared, "non-manifold edges with more than two faces");
            }
        }

        Ok(graph)
    }

    fn add_triangle(
        &mut self,
        verts: [usize; 3],
        uvs: Option<[usize; 3]>,
        strict: bool,
    ) -> Result<()> {
        let tri = self.triangles.len();
        self.triangles.push(Triangle {
            vertices: verts,
            edges: Vec::with_capacity(3),
            neighbours: Vec::new(),
            used: false,
            uvs,
        });

        // Corner order (2, 0, 1) with edges (v2,v0), (v0,v1), (v1,v2);
        // enumeration order feeds the strip heuristics, keep it stable.
        for corner in [2usize, 0, 1] {
            let a = verts[corner];
            let b = verts[(corner + 1) % 3];
            self.vertices[a].triangles.push(tri);
            self.attach_edge(a, b, tri, strict)?;
        }

        Ok(())
    }

    fn attach_edge(&mut self, a: usize, b: usize, tri: usize, strict: bool) -> Result<()> {
        let key = (a.min(b), a.max(b));
        let edge = match self.edge_lookup.get(&key) {
            Some(&edge) => {
                if strict && self.edges[edge].triangles.len() > 1 {
                    return Err(GnoError::Topology(
                        "an edge has more than 2 faces, cannot strippify".into(),
                    ));
                }
                edge
            }
            None => {
                let edge = self.edges.len();
                self.edges.push(Edge {
                    vertices: (a, b),
                    triangles: Vec::with_capacity(2),
                });
                self.edge_lookup.insert(key, edge);
                edge
            }
        };

        for i in 0..self.edges[edge].triangles.len() {
            let other = self.edges[edge].triangles[i];
            self.triangles[other].neighbours.push(tri);
            self.triangles[tri].neighbours.push(other);
        }
        self.edges[edge].triangles.push(tri);
        self.triangles[tri].edges.push(edge);

        Ok(())
    }

    /// Edge connecting two vertices, if any.
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&(a.min(b), a.max(b))).copied()
    }

    /// Edge shared by two triangles, if any.
    pub fn shared_edge(&self, tri_a: usize, tri_b: usize) -> Option<usize> {
        self.triangles[tri_a]
            .edges
            .iter()
            .copied()
            .find(|e| self.triangles[tri_b].edges.contains(e))
    }

    /// Number of triangles at this vertex not yet written into a strip.
    pub fn available_tris(&self, vertex: usize) -> usize {
        self.vertices[vertex]
            .triangles
            .iter()
            .filter(|&&t| !self.triangles[t].used)
            .count()
    }

    /// Unused neighbours of a triangle, in adjacency order.
    pub fn available_neighbours(&self, tri: usize) -> Vec<usize> {
        self.triangles[tri]
            .neighbours
            .iter()
            .copied()
            .filter(|&t| !self.triangles[t].used)
            .collect()
    }
}
