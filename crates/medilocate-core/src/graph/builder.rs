//! Location graph construction.
//!
//! Produces a complete graph over pharmacies plus a synthetic origin node
//! with outgoing edges only, so the origin is never used as a relay.

use tracing::{debug, warn};

use super::{GraphError, GraphResult, WeightedGraph};
use crate::models::{LocatedEntity, PharmacyRecord};

/// Build the graph for one query.
///
/// Pharmacy edges are added in input order. Any entity with an invalid
/// coordinate or a repeated id rejects the whole build.
pub fn build_graph(
    origin: &LocatedEntity,
    pharmacies: &[LocatedEntity],
) -> GraphResult<WeightedGraph> {
    validate(origin)?;
    for pharmacy in pharmacies {
        validate(pharmacy)?;
    }

    let mut graph = WeightedGraph::new();
    for pharmacy in pharmacies {
        graph.add_node(pharmacy.id.clone())?;
    }

    for from in pharmacies {
        let from_coord = from.coordinate();
        for to in pharmacies.iter().filter(|to| to.id != from.id) {
            graph.add_edge(&from.id, &to.id, from_coord.distance_to(&to.coordinate()))?;
        }
    }

    // Origin goes in last and receives no inbound edges
    graph.add_node(origin.id.clone())?;
    let origin_coord = origin.coordinate();
    for to in pharmacies {
        graph.add_edge(&origin.id, &to.id, origin_coord.distance_to(&to.coordinate()))?;
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built location graph"
    );
    Ok(graph)
}

/// Build the graph from directory records, leaving out pharmacies that
/// have no usable coordinates.
pub fn build_graph_from_records<'a, I>(
    origin: &LocatedEntity,
    records: I,
) -> GraphResult<WeightedGraph>
where
    I: IntoIterator<Item = &'a PharmacyRecord>,
{
    let mut skipped = 0usize;
    let located: Vec<LocatedEntity> = records
        .into_iter()
        .filter_map(|record| {
            let entity = record.located();
            if entity.is_none() {
                skipped += 1;
            }
            entity
        })
        .collect();

    if skipped > 0 {
        warn!(skipped, "pharmacies without valid coordinates left out of graph");
    }

    build_graph(origin, &located)
}

fn validate(entity: &LocatedEntity) -> GraphResult<()> {
    if entity.coordinate().is_valid() {
        Ok(())
    } else {
        Err(GraphError::InvalidCoordinate {
            id: entity.id.clone(),
            latitude: entity.latitude,
            longitude: entity.longitude,
        })
    }
}
