//! Render dispatcher: turns product state into scene drawables.
//!
//! The dispatcher is the only component that adds or removes a product's
//! drawables in the scene. It keeps the last-rendered snapshot per product
//! and diffs it against the scheme's new output by drawable id: ids that
//! disappeared are removed, new or changed drawables are (re)added. A render
//! callback failure is logged and leaves the previous drawables untouched,
//! so a broken scheme degrades to "stale but visible".

use std::collections::HashMap;

use tracing::warn;

use crate::drawable::Drawable;
use crate::geom::WorldPos;
use crate::product::{Product, ProductId, Status};
use crate::scene::Scene;
use crate::scheme::RenderContext;

/// Apply an identity diff between two drawable sets against the scene.
///
/// Drawables present in `previous` but absent from `next` are removed;
/// drawables that are new or whose content changed are (re)added. Unchanged
/// drawables are left alone.
pub(crate) fn apply_diff(previous: &[Drawable], next: &[Drawable], scene: &mut dyn Scene) {
    for old in previous {
        if !next.iter().any(|d| d.id == old.id) {
            scene.remove_drawable(old.id);
        }
    }
    for drawable in next {
        let unchanged = previous.iter().any(|d| d == drawable);
        if !unchanged {
            scene.add_drawable(drawable.clone());
        }
    }
}

/// Per-product drawable bookkeeping and recomputation.
pub struct RenderDispatcher {
    rendered: HashMap<ProductId, Vec<Drawable>>,
}

impl RenderDispatcher {
    pub fn new() -> Self {
        Self {
            rendered: HashMap::new(),
        }
    }

    /// The last-rendered drawable snapshot for a product.
    pub fn last(&self, product: ProductId) -> &[Drawable] {
        self.rendered
            .get(&product)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Recompute a product's drawables and push the diff to the scene.
    ///
    /// `mouse` is the preview point under the pointer; it reaches the scheme
    /// only while the product is defining, so completed shapes stop
    /// following the pointer. Returns whether the render succeeded.
    pub fn render_product(
        &mut self,
        product: &Product,
        mouse: Option<WorldPos>,
        scene: &mut dyn Scene,
    ) -> bool {
        let id = product.id();
        let previous = self.rendered.remove(&id).unwrap_or_default();
        let positions = product.positions();
        let status = product.status();
        let ctx = RenderContext {
            positions: &positions,
            status,
            mouse: if status == Status::Defining { mouse } else { None },
            previous: &previous,
        };

        match product.scheme().render(&ctx) {
            Ok(next) => {
                apply_diff(&previous, &next, scene);
                self.rendered.insert(id, next);
                true
            }
            Err(error) => {
                warn!(
                    product = id,
                    scheme = product.scheme().type_name(),
                    %error,
                    "scheme render failed; keeping previous drawables"
                );
                self.rendered.insert(id, previous);
                false
            }
        }
    }

    /// Remove every drawable the dispatcher has rendered for a product.
    pub fn remove_all(&mut self, product: ProductId, scene: &mut dyn Scene) {
        if let Some(drawables) = self.rendered.remove(&product) {
            for drawable in drawables {
                scene.remove_drawable(drawable.id);
            }
        }
    }
}

impl Default for RenderDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawable::{Geometry, Style};
    use crate::scene::MemoryScene;

    fn point(id: u64, x: f64) -> Drawable {
        Drawable::with_id(
            id,
            Geometry::Point {
                position: WorldPos::new(x, 0.0, 0.0),
            },
            Style::default(),
        )
    }

    #[test]
    fn diff_removes_missing_and_adds_new() {
        let mut scene = MemoryScene::new();
        let previous = vec![point(1, 0.0), point(2, 1.0)];
        for d in &previous {
            scene.add_drawable(d.clone());
        }
        scene.add_calls = 0;

        let next = vec![point(2, 1.0), point(3, 2.0)];
        apply_diff(&previous, &next, &mut scene);

        assert!(!scene.contains(1));
        assert!(scene.contains(2));
        assert!(scene.contains(3));
        // unchanged drawable 2 was not re-added
        assert_eq!(scene.add_calls, 1);
    }

    #[test]
    fn diff_re_adds_changed_content_under_same_id() {
        let mut scene = MemoryScene::new();
        let previous = vec![point(7, 0.0)];
        scene.add_drawable(previous[0].clone());
        scene.add_calls = 0;

        let next = vec![point(7, 5.0)];
        apply_diff(&previous, &next, &mut scene);

        assert_eq!(scene.add_calls, 1);
        assert_eq!(scene.remove_calls, 0);
        assert_eq!(
            scene.drawable(7).unwrap().geometry,
            Geometry::Point {
                position: WorldPos::new(5.0, 0.0, 0.0)
            }
        );
    }
}
