//! Contexte de construction : blocs chargés, chargement paresseux des géométries
//!
//! L'ordre de chargement est imposé par les dépendances :
//! points -> points de limite -> lignes -> polygones.

use std::collections::{HashMap, HashSet};

use geo::{Coord, Geometry, LineString, Point};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::block::{BlockRole, DataBlock, GeometryOutcome};
use crate::feature::Feature;
use crate::geometry::{self, BoundaryRecord, Line};
use crate::layout::Layout;
use crate::store::RecordStore;
use crate::types::{BlockStats, BuildResult, FeatureError};
use crate::VfkError;

/// Résultat du calcul d'une feature : `Ok(None)` = pas de géométrie, sans erreur
type Outcome = Result<Option<Geometry>, VfkError>;

/// Lecteur VFK : possède les blocs et mémorise les géométries calculées
#[derive(Debug)]
pub struct Reader {
    layout: Layout,
    blocks: Vec<DataBlock>,
    by_name: HashMap<String, usize>,
    /// Lignes indexées par polygone référencé, par bloc de polygones
    polygon_index: HashMap<String, HashMap<u64, Vec<usize>>>,
    errors: Vec<FeatureError>,
}

impl Reader {
    pub fn new(store: RecordStore, layout: Layout) -> Result<Self, VfkError> {
        layout.validate()?;

        let mut blocks = Vec::with_capacity(store.blocks.len());
        let mut by_name = HashMap::with_capacity(store.blocks.len());
        for (name, records) in store.blocks {
            let role = layout.role(&name);
            by_name.insert(name.clone(), blocks.len());
            blocks.push(DataBlock::new(name, role, records));
        }

        Ok(Self {
            layout,
            blocks,
            by_name,
            polygon_index: HashMap::new(),
            errors: Vec::new(),
        })
    }

    pub fn blocks(&self) -> &[DataBlock] {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Option<&DataBlock> {
        self.by_name.get(name).map(|&i| &self.blocks[i])
    }

    /// Erreurs non fatales rencontrées jusqu'ici
    pub fn errors(&self) -> &[FeatureError] {
        &self.errors
    }

    fn index_of(&self, name: &str) -> Result<usize, VfkError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| VfkError::UnknownBlock(name.to_string()))
    }

    /// Charge les géométries d'un bloc (une seule fois) après ses dépendances
    pub fn load_geometry(&mut self, name: &str) -> Result<BlockStats, VfkError> {
        let idx = self.index_of(name)?;
        self.load_chain(name, true)?;
        Ok(self.blocks[idx].stats())
    }

    /// Géométrie d'une feature, calculée au besoin.
    ///
    /// Pour un bloc de polygones seule la feature demandée est construite ;
    /// les autres blocs sont chargés en entier.
    pub fn feature_geometry(&mut self, name: &str, fid: u64) -> Result<Option<&Geometry>, VfkError> {
        let idx = self.index_of(name)?;
        let Some(pos) = self.blocks[idx].position(fid) else {
            return Ok(None);
        };

        if !self.blocks[idx].features()[pos].is_geometry_loaded() {
            if self.blocks[idx].role() == BlockRole::Polygon {
                self.load_chain(name, false)?;
                let mut outcomes = self.compute_polygons(idx, &[pos])?;
                if let Some((_, outcome)) = outcomes.pop() {
                    self.apply_outcome(idx, pos, outcome);
                }
            } else {
                self.load_chain(name, true)?;
            }
        }

        Ok(self.blocks[idx].features()[pos].geometry())
    }

    /// Charge tous les blocs géométriques présents, dans l'ordre des dépendances
    pub fn load_all(&mut self) -> Result<Vec<BlockStats>, VfkError> {
        let mut stats = Vec::new();
        for name in self.layout.load_order() {
            let Some(&idx) = self.by_name.get(&name) else {
                debug!(block = %name, "Block not present, skipped");
                continue;
            };
            match self.load_geometry(&name) {
                Ok(s) => stats.push(s),
                Err(VfkError::UnknownBlock(dependency)) => {
                    warn!(block = %name, dependency = %dependency, "Missing dependency, geometry not loaded");
                    stats.push(self.blocks[idx].stats());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(stats)
    }

    /// Consomme le lecteur
    pub fn into_result(self, stats: Vec<BlockStats>) -> BuildResult {
        BuildResult {
            blocks: self.blocks,
            stats,
            errors: self.errors,
        }
    }

    /// Charge la chaîne de dépendances de `name`, avec ou sans `name` lui-même
    fn load_chain(&mut self, name: &str, include_self: bool) -> Result<(), VfkError> {
        let mut chain = self.layout.dependency_chain(name);
        if !include_self {
            chain.pop();
        }
        // vérifier toute la chaîne avant de charger quoi que ce soit
        let indices = chain
            .iter()
            .map(|dep| self.index_of(dep))
            .collect::<Result<Vec<_>, _>>()?;
        for idx in indices {
            if !self.blocks[idx].is_geometry_loaded() {
                self.load_block(idx)?;
            }
        }
        Ok(())
    }

    fn load_block(&mut self, idx: usize) -> Result<(), VfkError> {
        match self.blocks[idx].role() {
            BlockRole::Point => self.load_points(idx),
            BlockRole::Boundary => self.load_boundaries(idx)?,
            BlockRole::Line => self.load_lines(idx)?,
            BlockRole::Polygon => {
                let pending = pending_features(&self.blocks[idx]);
                let outcomes = self.compute_polygons(idx, &pending)?;
                for (pos, outcome) in outcomes {
                    self.apply_outcome(idx, pos, outcome);
                }
            }
            BlockRole::Attribute => {}
        }
        self.blocks[idx].mark_geometry_loaded();

        let stats = self.blocks[idx].stats();
        if stats.invalid > 0 {
            warn!(
                block = %stats.block,
                features = stats.features,
                valid = stats.valid,
                invalid = stats.invalid,
                "Geometry loaded with invalid features"
            );
        } else {
            info!(
                block = %stats.block,
                features = stats.features,
                valid = stats.valid,
                "Geometry loaded"
            );
        }
        Ok(())
    }

    fn load_points(&mut self, idx: usize) {
        let extent = self.layout.extent;
        let outcomes: Vec<(usize, Outcome)> = pending_features(&self.blocks[idx])
            .into_iter()
            .map(|pos| {
                let record = self.blocks[idx].features()[pos].properties();
                let outcome = geometry::load_point(record, extent.as_ref())
                    .map(|c| Some(Geometry::Point(Point::from(c))));
                (pos, outcome)
            })
            .collect();

        for (pos, outcome) in outcomes {
            self.apply_outcome(idx, pos, outcome);
        }
    }

    /// Parcours séquentiel : la géométrie de chaque ligne est portée par son premier point.
    ///
    /// Les points introuvables sont signalés par les blocs de lignes, pas ici.
    fn load_boundaries(&mut self, idx: usize) -> Result<(), VfkError> {
        let Some(layout) = self.layout.boundaries.get(self.blocks[idx].name()).cloned() else {
            return Ok(());
        };
        let points_idx = self.index_of(&layout.points)?;

        let mut outcomes: Vec<(usize, Outcome)> = Vec::new();
        {
            let block = &self.blocks[idx];
            let points = &self.blocks[points_idx];

            let mut positions = Vec::with_capacity(block.len());
            let mut records = Vec::with_capacity(block.len());
            for (pos, feature) in block.features().iter().enumerate() {
                match BoundaryRecord::from_feature(feature, &layout) {
                    Some(record) => {
                        positions.push(pos);
                        records.push(record);
                    }
                    None => outcomes.push((
                        pos,
                        Err(VfkError::degenerate(format!(
                            "missing {} or {}",
                            layout.point_key, layout.sequence
                        ))),
                    )),
                }
            }

            for run in geometry::split_sequences(&records) {
                let first = positions[run.start];
                let line = geometry::build_line(block.features()[first].fid(), &records[run.clone()], points);
                outcomes.push((first, line_outcome(line)));
                for &pos in &positions[run.start + 1..run.end] {
                    outcomes.push((pos, Ok(None)));
                }
            }
        }

        for (pos, outcome) in outcomes {
            self.apply_outcome(idx, pos, outcome);
        }
        Ok(())
    }

    /// Lignes : points de limite dont la clé (HP_ID, ...) vaut l'ID de la ligne
    fn load_lines(&mut self, idx: usize) -> Result<(), VfkError> {
        let Some(layout) = self.layout.lines.get(self.blocks[idx].name()).cloned() else {
            return Ok(());
        };
        let Some(boundary_layout) = self.layout.boundaries.get(&layout.boundary).cloned() else {
            return Err(VfkError::Layout(format!(
                "{} is not a boundary block",
                layout.boundary
            )));
        };
        let boundary_idx = self.index_of(&layout.boundary)?;
        let points_idx = self.index_of(&boundary_layout.points)?;

        let mut outcomes: Vec<(usize, Outcome)> = Vec::new();
        let mut notes: Vec<(usize, VfkError)> = Vec::new();
        {
            let block = &self.blocks[idx];
            let boundary = &self.blocks[boundary_idx];
            let points = &self.blocks[points_idx];
            let groups = boundary.group_by(&layout.key);
            // un point introuvable n'est signalé qu'une fois par bloc
            let mut reported: HashSet<u64> = HashSet::new();

            for pos in pending_features(block) {
                let fid = block.features()[pos].fid();
                let records: Vec<BoundaryRecord> = groups
                    .get(&fid)
                    .map(|members| {
                        members
                            .iter()
                            .filter_map(|&j| {
                                BoundaryRecord::from_feature(&boundary.features()[j], &boundary_layout)
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                if records.is_empty() {
                    outcomes.push((pos, Err(VfkError::degenerate("no boundary point"))));
                    continue;
                }

                let line = geometry::build_line(fid, &records, points);
                notes.extend(
                    line.unresolved
                        .iter()
                        .filter(|&&point_id| reported.insert(point_id))
                        .map(|&point_id| (pos, VfkError::PointNotFound { point_id })),
                );
                outcomes.push((pos, line_outcome(line)));
            }
        }

        self.record_notes(idx, notes);
        for (pos, outcome) in outcomes {
            self.apply_outcome(idx, pos, outcome);
        }
        Ok(())
    }

    /// Construit les polygones des features `positions` (en parallèle)
    fn compute_polygons(
        &mut self,
        idx: usize,
        positions: &[usize],
    ) -> Result<Vec<(usize, Outcome)>, VfkError> {
        let name = self.blocks[idx].name().to_string();
        let Some(layout) = self.layout.polygons.get(&name).cloned() else {
            return Ok(Vec::new());
        };
        let lines_idx = self.index_of(&layout.lines)?;

        if !self.polygon_index.contains_key(&name) {
            let index = self.blocks[lines_idx].group_by_any(&layout.keys);
            self.polygon_index.insert(name.clone(), index);
        }

        let index = &self.polygon_index[&name];
        let block = &self.blocks[idx];
        let lines = &self.blocks[lines_idx];

        let outcomes = positions
            .par_iter()
            .map(|&pos| {
                let fid = block.features()[pos].fid();
                let segments: Vec<Vec<Coord>> = index
                    .get(&fid)
                    .map(|members| {
                        members
                            .iter()
                            .map(|&j| segment_coords(&lines.features()[j]))
                            .collect()
                    })
                    .unwrap_or_default();
                let outcome = geometry::polygon_from_segments(&segments)
                    .map(|p| Some(Geometry::Polygon(p)));
                (pos, outcome)
            })
            .collect();

        Ok(outcomes)
    }

    fn apply_outcome(&mut self, idx: usize, pos: usize, outcome: Outcome) {
        match outcome {
            Ok(Some(g)) => self.blocks[idx].apply(pos, GeometryOutcome::Valid(g)),
            Ok(None) => self.blocks[idx].apply(pos, GeometryOutcome::Empty),
            Err(error) => {
                let block = self.blocks[idx].name().to_string();
                let fid = self.blocks[idx].features()[pos].fid();
                debug!(block = %block, fid, error = %error, "Invalid geometry");
                self.blocks[idx].apply(pos, GeometryOutcome::Invalid);
                self.errors.push(FeatureError { block, fid, error });
            }
        }
    }

    /// Erreurs signalées sans invalider la feature
    fn record_notes(&mut self, idx: usize, notes: Vec<(usize, VfkError)>) {
        for (pos, error) in notes {
            self.errors.push(FeatureError {
                block: self.blocks[idx].name().to_string(),
                fid: self.blocks[idx].features()[pos].fid(),
                error,
            });
        }
    }
}

fn pending_features(block: &DataBlock) -> Vec<usize> {
    block
        .features()
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.is_geometry_loaded())
        .map(|(i, _)| i)
        .collect()
}

fn line_outcome(line: Line) -> Outcome {
    line.check()?;
    Ok(Some(Geometry::LineString(line.into_line_string())))
}

/// Coordonnées de la ligne, vide si la ligne n'a pas de géométrie
fn segment_coords(feature: &Feature) -> Vec<Coord> {
    match feature.geometry() {
        Some(Geometry::LineString(LineString(coords))) => coords.clone(),
        _ => Vec::new(),
    }
}
