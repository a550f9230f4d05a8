use std::collections::HashMap;

/// Marker style for a moving object, one per fill color
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: u32,
    pub points: u32,
    pub radius: u32,
}

impl MarkerStyle {
    /// Sixteen-point marker with a thin grey outline
    pub fn for_color(color: &str) -> Self {
        Self {
            fill: color.to_string(),
            stroke: "grey".to_string(),
            stroke_width: 1,
            points: 16,
            radius: 6,
        }
    }
}

/// Memoizing color → style lookup.
///
/// Renderers create one style handle per distinct color and reuse it for
/// every feature of that color.
#[derive(Debug)]
pub struct StyleCache<S> {
    styles: HashMap<String, S>,
}

impl<S> StyleCache<S> {
    pub fn new() -> Self {
        Self {
            styles: HashMap::new(),
        }
    }

    /// Return the cached style for `color`, building it on first use
    pub fn get_or_insert_with<F>(&mut self, color: &str, build: F) -> &S
    where
        F: FnOnce(&str) -> S,
    {
        self.styles
            .entry(color.to_string())
            .or_insert_with(|| build(color))
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl<S> Default for StyleCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_built_once_per_color() {
        let mut cache: StyleCache<MarkerStyle> = StyleCache::new();
        let mut builds = 0;

        for color in ["red", "blue", "red", "red"] {
            cache.get_or_insert_with(color, |c| {
                builds += 1;
                MarkerStyle::for_color(c)
            });
        }

        assert_eq!(builds, 2);
        assert_eq!(cache.len(), 2);
        let red = cache.get_or_insert_with("red", MarkerStyle::for_color);
        assert_eq!(red.fill, "red");
        assert_eq!(red.stroke, "grey");
    }
}
