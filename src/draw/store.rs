//! Categorised shape collections backing the canvas.

use super::shape::Shape;
use serde::{Deserialize, Serialize};

/// The four disjoint shape lists the canvas keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// The permanent record, drawn from the cached raster
    Committed,
    /// Shapes being built by the create module
    Creating,
    /// Shapes being built by affect modules
    Affecting,
    /// Visual aids; never committed, exported or persisted
    Guides,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Committed,
        Category::Creating,
        Category::Affecting,
        Category::Guides,
    ];
}

/// Ordered shape lists, first element drawn at the bottom.
///
/// All accessors are total: asking an empty category for its current shape
/// returns `None`, and replacing or removing it does nothing.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    committed: Vec<Shape>,
    creating: Vec<Shape>,
    affecting: Vec<Shape>,
    guides: Vec<Shape>,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self, category: Category) -> &[Shape] {
        match category {
            Category::Committed => &self.committed,
            Category::Creating => &self.creating,
            Category::Affecting => &self.affecting,
            Category::Guides => &self.guides,
        }
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<Shape> {
        match category {
            Category::Committed => &mut self.committed,
            Category::Creating => &mut self.creating,
            Category::Affecting => &mut self.affecting,
            Category::Guides => &mut self.guides,
        }
    }

    pub fn len(&self, category: Category) -> usize {
        self.shapes(category).len()
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.shapes(category).is_empty()
    }

    /// True when no category holds a shape.
    pub fn is_blank(&self) -> bool {
        Category::ALL.iter().all(|category| self.is_empty(*category))
    }

    /// Appends a shape; it becomes the category's current shape.
    pub fn push(&mut self, category: Category, shape: Shape) {
        self.list_mut(category).push(shape);
    }

    /// Most recently added shape of the category.
    pub fn current(&self, category: Category) -> Option<&Shape> {
        self.shapes(category).last()
    }

    pub fn current_mut(&mut self, category: Category) -> Option<&mut Shape> {
        self.list_mut(category).last_mut()
    }

    /// Replaces the current shape. Returns the previous one, or `None` (and
    /// drops `shape`) when the category is empty.
    pub fn set_current(&mut self, category: Category, shape: Shape) -> Option<Shape> {
        self.list_mut(category)
            .last_mut()
            .map(|slot| std::mem::replace(slot, shape))
    }

    pub fn remove_current(&mut self, category: Category) -> Option<Shape> {
        self.list_mut(category).pop()
    }

    /// Moves an in-progress category into `committed`.
    ///
    /// With `draw_under` the shapes are inserted beneath everything already
    /// committed, keeping their own relative order. Returns how many shapes
    /// moved; committing `Committed` or `Guides` moves nothing.
    pub fn commit(&mut self, category: Category, draw_under: bool) -> usize {
        let source = match category {
            Category::Creating => &mut self.creating,
            Category::Affecting => &mut self.affecting,
            Category::Committed | Category::Guides => return 0,
        };
        let moved = source.len();
        if draw_under {
            self.committed.splice(0..0, source.drain(..));
        } else {
            self.committed.append(source);
        }
        moved
    }

    /// Commits creating and affecting shapes together.
    ///
    /// On top the result is `previous, creating, affecting`; underneath it is
    /// `affecting, creating, previous`.
    pub fn commit_all(&mut self, draw_under: bool) -> usize {
        self.commit(Category::Creating, draw_under) + self.commit(Category::Affecting, draw_under)
    }

    /// Empties every category.
    pub fn clear(&mut self) {
        for category in Category::ALL {
            self.list_mut(category).clear();
        }
    }

    /// Replaces the committed record, e.g. when loading a drawing.
    pub fn replace_committed(&mut self, shapes: Vec<Shape>) {
        self.committed = shapes;
    }

    /// Committed, creating then affecting shapes in draw order (no guides).
    pub fn drawable(&self) -> impl Iterator<Item = &Shape> {
        self.committed
            .iter()
            .chain(self.creating.iter())
            .chain(self.affecting.iter())
    }
}
