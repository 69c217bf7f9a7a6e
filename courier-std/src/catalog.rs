//! # Capability Catalog
//!
//! Scans units once and answers three questions for the rest of the build:
//!
//! - which types implement each [`ShapeKind`], closed or still open;
//! - which marker capabilities each concrete type carries (its own key, its
//!   declared capabilities, and those of every base in its chain);
//! - which message declaration a message path refers to, for response
//!   inference during specialization.
//!
//! A type inherits every shape and capability declared along its base chain.
//! The chain ends at the first base no unit defines. Abstract types take part
//! in inheritance but never become implementations or candidates.

use crate::{
    specialize::BuildBudget,
    unit::{MessageDecl, TypeDef, Unit},
};
use courier_core::{RegistrationError, ShapeInstance, ShapeKind, TypeKey};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// One type implementing one shape instance.
#[derive(Debug, Clone)]
pub struct Implementation {
    key: TypeKey,
    shape: ShapeInstance,
    direct: bool,
    constraints: BTreeMap<usize, Vec<TypeKey>>,
    order: i32,
    position: usize,
}

impl Implementation {
    /// Key of the implementing type.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// The implemented shape instance.
    pub fn shape(&self) -> &ShapeInstance {
        &self.shape
    }

    /// `true` if the type declares the shape itself rather than inheriting it.
    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Constraints on one slot.
    pub fn slot_constraints(&self, slot: usize) -> &[TypeKey] {
        self.constraints.get(&slot).map_or(&[], Vec::as_slice)
    }

    /// Declared behavior order.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Position in scan order across all shapes, closed and open.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Constraints on every slot.
    pub fn constraints(&self) -> &BTreeMap<usize, Vec<TypeKey>> {
        &self.constraints
    }

    /// Number of generic slots across the type and its shape arguments.
    pub fn slot_count(&self) -> usize {
        self.shape
            .args()
            .iter()
            .map(TypeKey::slot_count)
            .chain(std::iter::once(self.key.slot_count()))
            .max()
            .unwrap_or(0)
    }

    /// `true` while any slot is unresolved.
    pub fn is_open(&self) -> bool {
        self.key.is_open() || self.shape.is_open()
    }

    /// A single-slot notification handler whose message is the bare slot.
    pub fn is_catch_all(&self) -> bool {
        self.shape.kind() == ShapeKind::NotificationHandler
            && self.slot_count() == 1
            && self.shape.message().is_slot()
    }
}

/// The result of scanning a set of units.
#[derive(Debug, Default)]
pub struct Catalog {
    closed: HashMap<ShapeKind, Vec<Implementation>>,
    open: HashMap<ShapeKind, Vec<Implementation>>,
    capabilities: HashMap<TypeKey, HashSet<TypeKey>>,
    concrete: Vec<TypeKey>,
    messages: HashMap<String, (TypeKey, MessageDecl)>,
    scanned: usize,
}

/// Scan settings the catalog needs from the configuration.
pub struct ScanOptions<'a> {
    /// Inclusion predicate for implementations.
    pub filter: &'a (dyn Fn(&TypeKey) -> bool + Send + Sync),
    /// Keep open handlers other than catch-alls.
    pub allow_open_generic_handlers: bool,
}

impl Catalog {
    /// Scans `units`, deduplicated by name with the first occurrence kept.
    pub fn scan(
        units: &[Unit],
        options: &ScanOptions<'_>,
        budget: &BuildBudget,
    ) -> Result<Self, RegistrationError> {
        let mut seen = HashSet::new();
        let units: Vec<&Unit> = units
            .iter()
            .filter(|unit| seen.insert(unit.name()))
            .collect();
        let index = DefIndex::new(&units);

        let mut catalog = Catalog::default();
        for unit in &units {
            budget.check()?;
            for def in unit.types() {
                catalog.add(def, &index, options);
            }
        }
        Ok(catalog)
    }

    fn add(&mut self, def: &TypeDef, index: &DefIndex<'_>, options: &ScanOptions<'_>) {
        if let (Some(message), Some(path)) = (def.message(), def.key().path()) {
            self.messages
                .entry(path.to_string())
                .or_insert_with(|| (def.key().clone(), message.clone()));
        }

        let lineage = index.lineage(def);

        if !def.is_abstract() && !def.key().is_open() {
            let mut capabilities: HashSet<TypeKey> = HashSet::new();
            capabilities.insert(def.key().clone());
            capabilities.extend(def.capabilities().iter().cloned());
            for ancestor in &lineage {
                capabilities.insert(ancestor.key.clone());
                capabilities.extend(ancestor.capabilities.iter().cloned());
            }
            if !self.capabilities.contains_key(def.key()) {
                self.concrete.push(def.key().clone());
                self.capabilities.insert(def.key().clone(), capabilities);
            }
        }

        if def.is_abstract() || !(options.filter)(def.key()) {
            return;
        }

        let mut shapes: Vec<(ShapeInstance, bool)> = def
            .shapes()
            .iter()
            .map(|shape| (shape.clone(), true))
            .collect();
        for ancestor in &lineage {
            for shape in &ancestor.shapes {
                if !shapes.iter().any(|(known, _)| known == shape) {
                    shapes.push((shape.clone(), false));
                }
            }
        }

        for (shape, direct) in shapes {
            let implementation = Implementation {
                key: def.key().clone(),
                shape,
                direct,
                constraints: def.constraints().clone(),
                order: def.behavior_order(),
                position: self.scanned,
            };
            self.scanned += 1;
            let kind = implementation.shape.kind();
            if !implementation.is_open() {
                self.closed.entry(kind).or_default().push(implementation);
                continue;
            }
            let kept = options.allow_open_generic_handlers
                || kind == ShapeKind::PipelineBehavior
                || implementation.is_catch_all();
            if kept {
                self.open.entry(kind).or_default().push(implementation);
            } else {
                debug!(
                    implementation = %implementation.key,
                    shape = %implementation.shape,
                    "open handler skipped; open generic handlers are disabled"
                );
            }
        }
    }

    /// Closed implementations of `kind`, in scan order.
    pub fn implementations(&self, kind: ShapeKind) -> &[Implementation] {
        self.closed.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Open implementations of `kind`, in scan order.
    pub fn open_implementations(&self, kind: ShapeKind) -> &[Implementation] {
        self.open.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Capabilities of a concrete type; `None` if no unit defines it.
    pub fn capabilities_of(&self, key: &TypeKey) -> Option<&HashSet<TypeKey>> {
        self.capabilities.get(key)
    }

    /// The full capability table.
    pub fn capability_table(&self) -> &HashMap<TypeKey, HashSet<TypeKey>> {
        &self.capabilities
    }

    /// Concrete, non-abstract types carrying every capability in `constraints`.
    pub fn candidates(&self, constraints: &[TypeKey]) -> Vec<TypeKey> {
        self.concrete
            .iter()
            .filter(|key| satisfies(&self.capabilities, key, constraints))
            .cloned()
            .collect()
    }

    /// Response of a (specialized) request type, from its own declaration.
    pub fn infer_response(&self, message: &TypeKey) -> Option<TypeKey> {
        let (declared, decl) = self.messages.get(message.path()?)?;
        let MessageDecl::Request { response } = decl else {
            return None;
        };
        let binding = declared.unify(message)?;
        response
            .substitute(&complete_binding(binding))
            .filter(|response| !response.is_open())
    }
}

/// Whether `key` carries every capability in `constraints`.
///
/// Types absent from the table satisfy only an empty constraint list.
pub(crate) fn satisfies(
    table: &HashMap<TypeKey, HashSet<TypeKey>>,
    key: &TypeKey,
    constraints: &[TypeKey],
) -> bool {
    if constraints.is_empty() {
        return true;
    }
    table
        .get(key)
        .is_some_and(|capabilities| constraints.iter().all(|c| capabilities.contains(c)))
}

/// Turns a partial unification result into a substitutable binding, leaving
/// unbound slots in place.
pub(crate) fn complete_binding(binding: Vec<Option<TypeKey>>) -> Vec<TypeKey> {
    binding
        .into_iter()
        .enumerate()
        .map(|(slot, bound)| bound.unwrap_or(TypeKey::Slot(slot)))
        .collect()
}

/// A base type with its declaration applied to the base's arguments.
struct Ancestor {
    key: TypeKey,
    shapes: Vec<ShapeInstance>,
    capabilities: Vec<TypeKey>,
    base: Option<TypeKey>,
}

/// Lookup of every declaration by key and by path.
struct DefIndex<'a> {
    by_key: HashMap<&'a TypeKey, &'a TypeDef>,
    by_path: HashMap<&'a str, Vec<&'a TypeDef>>,
}

impl<'a> DefIndex<'a> {
    fn new(units: &[&'a Unit]) -> Self {
        let mut by_key = HashMap::new();
        let mut by_path: HashMap<&'a str, Vec<&'a TypeDef>> = HashMap::new();
        for def in units.iter().copied().flat_map(Unit::types) {
            by_key.entry(def.key()).or_insert(def);
            if let Some(path) = def.key().path() {
                by_path.entry(path).or_default().push(def);
            }
        }
        Self { by_key, by_path }
    }

    fn resolve(&self, base: &TypeKey) -> Option<Ancestor> {
        if let Some(def) = self.by_key.get(base) {
            return Some(Ancestor {
                key: base.clone(),
                shapes: def.shapes().to_vec(),
                capabilities: def.capabilities().to_vec(),
                base: def.base().cloned(),
            });
        }
        // A generic base such as `Repository<User>` declared as `Repository<$0>`.
        let candidates = self.by_path.get(base.path()?)?;
        candidates.iter().find_map(|def| {
            let binding = complete_binding(def.key().unify(base)?);
            Some(Ancestor {
                key: base.clone(),
                shapes: def
                    .shapes()
                    .iter()
                    .filter_map(|shape| shape.substitute(&binding))
                    .collect(),
                capabilities: def
                    .capabilities()
                    .iter()
                    .filter_map(|capability| capability.substitute(&binding))
                    .collect(),
                base: def.base().and_then(|base| base.substitute(&binding)),
            })
        })
    }

    /// Every base of `def`, nearest first, stopping at an undefined base or a
    /// cycle.
    fn lineage(&self, def: &TypeDef) -> Vec<Ancestor> {
        let mut visited = HashSet::new();
        visited.insert(def.key().clone());
        let mut chain = Vec::new();
        let mut next = def.base().cloned();
        while let Some(base) = next {
            if !visited.insert(base.clone()) {
                break;
            }
            let Some(ancestor) = self.resolve(&base) else {
                break;
            };
            next = ancestor.base.clone();
            chain.push(ancestor);
        }
        chain
    }
}
