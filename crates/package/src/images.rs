//! Picking preview images out of a package.

use crate::consts::{CONTENT_EXTENSIONS, IMAGE_EXTENSIONS, SIMILARITY_THRESHOLD, TEXTURE_MARKER, extension, file_stem};
use crate::manifest::Manifest;
use crate::similarity::similarity;

/// An archive entry chosen as a preview image, with its ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Entry path exactly as it appears in the manifest or archive.
    pub path: String,
    pub sort_weight: i32,
}

fn is_image(path: &str) -> bool {
    !path.contains(TEXTURE_MARKER) && extension(path).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn is_content(path: &str) -> bool {
    extension(path).is_some_and(|ext| CONTENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Decide which entries of a package are its preview images.
///
/// Images declared in the manifest's content list win outright, weighted in
/// declaration order. Otherwise every image entry in the archive is compared
/// by name against the package name and the package's content files; the
/// close matches are kept, weighted by their score. When nothing is close
/// enough, every image is returned with weight zero.
///
/// # Examples
///
/// ```
/// use varstash_package::{ImageCandidate, Manifest, select_images};
///
/// let entries = ["SceneA.jpg", "SceneA.json", "Unrelated.png"].map(String::from);
/// let selected = select_images(&entries, &Manifest::default(), "SceneA");
/// assert_eq!(selected, vec![ImageCandidate { path: "SceneA.jpg".to_string(), sort_weight: 100 }]);
/// ```
pub fn select_images(entries: &[String], manifest: &Manifest, base_name: &str) -> Vec<ImageCandidate> {
    let declared = from_manifest(manifest);
    if !declared.is_empty() {
        return declared;
    }
    from_entries(entries, base_name)
}

fn from_manifest(manifest: &Manifest) -> Vec<ImageCandidate> {
    let images: Vec<&String> = manifest.content_list.iter().filter(|path| is_image(path)).collect();
    let count = i32::try_from(images.len()).unwrap_or(i32::MAX);
    images
        .into_iter()
        .zip(0i32..)
        .map(|(path, index)| ImageCandidate {
            path: path.clone(),
            sort_weight: 100i32.saturating_sub(index.saturating_mul(count)),
        })
        .collect()
}

fn from_entries(entries: &[String], base_name: &str) -> Vec<ImageCandidate> {
    let candidates: Vec<&String> = entries.iter().filter(|path| is_image(path)).collect();
    if candidates.is_empty() {
        return Vec::new();
    }
    let corpus: Vec<&str> = std::iter::once(base_name)
        .chain(entries.iter().filter(|path| is_content(path)).map(|path| file_stem(path)))
        .collect();

    let scored: Vec<ImageCandidate> = candidates
        .iter()
        .filter_map(|path| {
            let name = file_stem(path);
            let best = corpus.iter().map(|other| similarity(name, other)).fold(0.0, f64::max);
            (best > SIMILARITY_THRESHOLD).then(|| ImageCandidate {
                path: (*path).clone(),
                sort_weight: best.round() as i32,
            })
        })
        .collect();
    if !scored.is_empty() {
        return scored;
    }
    tracing::debug!(base_name, candidates = candidates.len(), "no confident image match, keeping all images");
    candidates.into_iter().map(|path| ImageCandidate { path: path.clone(), sort_weight: 0 }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn manifest(entries: &[&str]) -> Manifest {
        Manifest { content_list: strings(entries), ..Default::default() }
    }

    fn candidate(path: &str, sort_weight: i32) -> ImageCandidate {
        ImageCandidate { path: path.to_string(), sort_weight }
    }

    #[rstest]
    #[case("preview.jpg", true)]
    #[case("Saves/scene/preview.PNG", true)]
    #[case("Custom/Atom/Person/Textures/skin.jpg", false)]
    #[case("preview.jpeg", false)]
    #[case("preview.json", false)]
    fn test_is_image(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_image(path), expected);
    }

    #[test]
    fn test_manifest_single_image() {
        let selected = select_images(&[], &manifest(&["preview.jpg", "scene.json"]), "Alice.MyScene.1");
        assert_eq!(selected, vec![candidate("preview.jpg", 100)]);
    }

    #[test]
    fn test_manifest_weights_follow_declaration_order() {
        let m = manifest(&["a.jpg", "scene.json", "b.png", "c.jpg"]);
        let selected = select_images(&[], &m, "x");
        assert_eq!(selected, vec![candidate("a.jpg", 100), candidate("b.png", 97), candidate("c.jpg", 94)]);
    }

    #[test]
    fn test_manifest_textures_are_ignored() {
        let entries = strings(&["Scene.jpg", "Scene.json"]);
        let m = manifest(&["Custom/Textures/skin.jpg", "Scene.json"]);
        // No declared previews, so the archive entries are used instead.
        assert_eq!(select_images(&entries, &m, "Scene"), vec![candidate("Scene.jpg", 100)]);
    }

    #[test]
    fn test_manifest_takes_precedence_over_entries() {
        let entries = strings(&["Scene.jpg", "Scene.json", "declared.png"]);
        let selected = select_images(&entries, &manifest(&["declared.png"]), "Scene");
        assert_eq!(selected, vec![candidate("declared.png", 100)]);
    }

    #[test]
    fn test_fallback_excludes_unrelated_images() {
        let entries = strings(&["SceneA.jpg", "SceneA.json", "Unrelated.png"]);
        let selected = select_images(&entries, &Manifest::default(), "SceneA");
        assert_eq!(selected, vec![candidate("SceneA.jpg", 100)]);
    }

    #[test]
    fn test_fallback_matches_content_files_in_subdirectories() {
        let entries = strings(&[
            "Custom/Clothing/Female/Alice/Dress/Dress.vam",
            "Custom/Clothing/Female/Alice/Dress/Dress.jpg",
            "Custom/Clothing/Female/Alice/Dress/Textures/Dress_D.png",
        ]);
        let selected = select_images(&entries, &Manifest::default(), "Alice.DressPack.2");
        assert_eq!(selected, vec![candidate("Custom/Clothing/Female/Alice/Dress/Dress.jpg", 100)]);
    }

    #[test]
    fn test_fallback_returns_everything_when_nothing_matches() {
        let entries = strings(&["Foo.jpg", "SceneA.json", "Bar.png"]);
        let selected = select_images(&entries, &Manifest::default(), "SceneA");
        assert_eq!(selected, vec![candidate("Foo.jpg", 0), candidate("Bar.png", 0)]);
    }

    #[test]
    fn test_no_images_at_all() {
        let entries = strings(&["SceneA.json", "meta.json"]);
        assert!(select_images(&entries, &Manifest::default(), "SceneA").is_empty());
    }
}
