//! Pet name generation for `random_pet`.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{with_secure_rng, RandomError};

const ADVERBS: &[&str] = &[
    "abnormally", "absolutely", "accurately", "actively", "actually", "adequately", "admittedly",
    "adversely", "allegedly", "amazingly", "annually", "apparently", "approximately", "arguably",
    "awfully", "badly", "barely", "basically", "blatantly", "blindly", "briefly", "brightly",
    "broadly", "carefully", "centrally", "certainly", "cheaply", "cleanly", "clearly", "closely",
    "commonly", "completely", "constantly", "conversely", "correctly", "curiously", "currently",
    "daily", "deadly", "deeply", "definitely", "deliberately", "densely", "directly", "distinctly",
    "duly", "eagerly", "early", "easily", "eminently", "endlessly", "enormously", "entirely",
    "equally", "especially", "evenly", "evidently", "exactly", "explicitly", "externally",
    "extremely", "factually", "fairly", "finally", "firmly", "firstly", "forcibly", "formally",
    "formerly", "frankly", "freely", "frequently", "friendly", "fully", "generally", "gently",
    "genuinely", "ghastly", "gladly", "globally", "gradually", "gratefully", "greatly", "grossly",
    "happily", "hardly", "heartily", "heavily", "hideously", "highly", "honestly", "hopefully",
    "hopelessly", "horribly", "hugely", "humbly", "ideally", "illegally", "immensely", "implicitly",
    "incredibly", "indirectly", "individually", "infinitely", "informally", "inherently",
    "initially", "instantly", "intensely", "internally", "jointly", "jolly", "kindly", "largely",
    "lately", "legally", "lightly", "likely", "literally", "lively", "locally", "logically",
    "loosely", "loudly", "lovely", "luckily", "mainly", "manually", "marginally", "mentally",
    "merely", "mildly", "miserably", "mistakenly", "moderately", "monthly", "morally", "mostly",
    "multiply", "mutually", "namely", "nationally", "naturally", "nearly", "neatly", "needlessly",
    "newly", "nicely", "nominally", "normally", "notably", "noticeably", "obviously", "oddly",
    "officially", "openly", "optionally", "overly", "painfully", "partially", "partly",
    "perfectly", "personally", "physically", "plainly", "pleasantly", "poorly", "positively",
    "possibly", "precisely", "preferably", "presently", "presumably", "previously", "primarily",
    "privately", "probably", "promptly", "properly", "publicly", "purely", "quickly", "quietly",
    "radically", "randomly", "rapidly", "rarely", "rationally", "readily", "really", "reasonably",
    "recently", "regularly", "reliably", "remarkably", "remotely", "repeatedly", "rightly",
    "roughly", "routinely", "sadly", "safely", "scarcely", "secondly", "secretly", "seemingly",
    "sensibly", "separately", "seriously", "severely", "sharply", "shortly", "similarly",
    "simply", "sincerely", "singularly", "slightly", "slowly", "smoothly", "socially", "solely",
    "specially", "steadily", "strangely", "strictly", "strongly", "subtly", "suddenly",
    "suitably", "supposedly", "surely", "terminally", "terribly", "thankfully", "thoroughly",
    "tightly", "totally", "trivially", "truly", "typically", "ultimately", "unduly", "uniformly",
    "uniquely", "unlikely", "urgently", "usefully", "usually", "utterly", "vaguely", "vastly",
    "verbally", "vertically", "vigorously", "violently", "virtually", "visually", "weekly",
    "wholly", "widely", "wildly", "willingly", "wrongly", "yearly",
];

const ADJECTIVES: &[&str] = &[
    "able", "above", "absolute", "accepted", "accurate", "ace", "active", "actual", "adapted",
    "adapting", "adequate", "adjusted", "advanced", "alert", "alive", "allowed", "allowing",
    "amazed", "amazing", "ample", "amused", "amusing", "apparent", "apt", "arriving", "artistic",
    "assured", "assuring", "awaited", "awake", "aware", "balanced", "becoming", "beloved",
    "better", "big", "blessed", "bold", "boss", "brave", "brief", "bright", "bursting", "busy",
    "calm", "capable", "capital", "careful", "caring", "casual", "causal", "central", "certain",
    "champion", "charmed", "charming", "cheerful", "chief", "choice", "civil", "classic", "clean",
    "clear", "clever", "climbing", "close", "closing", "coherent", "comic", "communal", "complete",
    "composed", "concise", "concrete", "content", "cool", "correct", "cosmic", "crack", "creative",
    "credible", "crisp", "crucial", "cuddly", "cunning", "curious", "current", "cute", "daring",
    "darling", "dashing", "dear", "decent", "deciding", "deep", "definite", "delicate", "desired",
    "destined", "devoted", "direct", "discrete", "distinct", "diverse", "divine", "dominant",
    "driven", "driving", "dynamic", "eager", "easy", "electric", "elegant", "emerging", "eminent",
    "enabled", "enabling", "endless", "engaged", "engaging", "enhanced", "enjoyed", "enormous",
    "enough", "epic", "equal", "equipped", "eternal", "ethical", "evident", "evolved", "evolving",
    "exact", "excited", "exciting", "exotic", "expert", "factual", "fair", "faithful", "famous",
    "fancy", "fast", "feasible", "fine", "finer", "firm", "first", "fit", "fitting", "fleet",
    "flexible", "flowing", "fluent", "flying", "fond", "frank", "free", "fresh", "full", "fun",
    "funky", "funny", "game", "generous", "gentle", "genuine", "giving", "glad", "glorious",
    "glowing", "golden", "good", "gorgeous", "grand", "grateful", "great", "growing", "grown",
    "guided", "guiding", "handy", "happy", "hardy", "harmless", "healthy", "helped", "helpful",
    "helping", "heroic", "hip", "holy", "honest", "hopeful", "hot", "huge", "humane", "humble",
    "humorous", "ideal", "immense", "immortal", "immune", "improved", "in", "included", "infinite",
    "informed", "innocent", "inspired", "integral", "intense", "intent", "internal", "intimate",
    "inviting", "joint", "just", "keen", "key", "kind", "knowing", "known", "large", "lasting",
    "leading", "learning", "legal", "legible", "lenient", "liberal", "light", "liked", "literate",
    "live", "living", "logical", "loved", "loving", "loyal", "lucky", "magical", "magnetic",
    "main", "major", "many", "massive", "master", "mature", "maximum", "measured", "meet",
    "merry", "mighty", "mint", "model", "modern", "modest", "moral", "more", "moved", "moving",
    "musical", "mutual", "national", "native", "natural", "nearby", "neat", "needed", "neutral",
    "new", "next", "nice", "noble", "normal", "notable", "noted", "novel", "obliging", "on",
    "one", "open", "optimal", "optimum", "organic", "oriented", "outgoing", "patient", "peaceful",
    "perfect", "pet", "picked", "pleasant", "pleased", "pleasing", "poetic", "polished", "polite",
    "popular", "positive", "possible", "powerful", "precious", "precise", "premium", "prepared",
    "present", "pretty", "primary", "prime", "pro", "probable", "profound", "promoted", "prompt",
    "proper", "proud", "proven", "pumped", "pure", "quality", "quick", "quiet", "rapid", "rare",
    "rational", "ready", "real", "refined", "regular", "related", "relative", "relaxed",
    "relaxing", "relevant", "relieved", "renewed", "renewing", "resolved", "rested", "rich",
    "right", "robust", "romantic", "ruling", "sacred", "safe", "saved", "saving", "secure",
    "select", "selected", "sensible", "set", "settled", "settling", "sharp", "shining", "simple",
    "sincere", "singular", "skilled", "smart", "smashing", "smiling", "smooth", "social", "solid",
    "sought", "sound", "special", "splendid", "square", "stable", "star", "steady", "sterling",
    "still", "stirred", "stirring", "striking", "strong", "stunning", "subtle", "suitable",
    "summary", "sunny", "super", "superb", "supreme", "sure", "surprised", "sweeping", "sweet",
    "tender", "thankful", "thorough", "tidy", "tight", "together", "tolerant", "top",
    "topical", "tough", "touched", "touching", "tremendous", "trusted", "trusting", "trusty",
    "ultimate", "unbiased", "uncommon", "unified", "unique", "united", "up", "upright", "upward",
    "usable", "useful", "valid", "valued", "vast", "verified", "viable", "vital", "vocal",
    "wanted", "warm", "wealthy", "welcome", "welcomed", "well", "whole", "willing", "winning",
    "wired", "wise", "witty", "wondrous", "workable", "working", "worthy",
];

const NAMES: &[&str] = &[
    "aardvark", "adder", "airedale", "akita", "albacore", "alien", "alpaca", "amoeba", "anchovy",
    "anemone", "ant", "anteater", "antelope", "ape", "aphid", "arachnid", "asp", "baboon",
    "badger", "barnacle", "basilisk", "bass", "bat", "beagle", "bear", "bedbug", "bee", "beetle",
    "bengal", "bird", "bison", "blowfish", "bluebird", "bluegill", "bluejay", "boa", "boar",
    "bobcat", "bonefish", "boxer", "bream", "buck", "buffalo", "bug", "bull", "bulldog", "bullfrog",
    "bunny", "burro", "buzzard", "caiman", "calf", "camel", "cardinal", "caribou", "cat",
    "catfish", "cattle", "chamois", "cheetah", "chicken", "chigger", "chimp", "chipmunk",
    "cicada", "civet", "clam", "cobra", "cockatoo", "cod", "colt", "condor", "coral", "corgi",
    "cougar", "cow", "cowbird", "coyote", "crab", "crane", "crappie", "crawdad", "crayfish",
    "cricket", "crow", "cub", "dane", "dassie", "deer", "dingo", "dinosaur", "doberman",
    "dodo", "doe", "dog", "dogfish", "dolphin", "donkey", "dory", "dove", "dragon", "drake",
    "drum", "duck", "duckling", "eagle", "earwig", "eel", "egret", "elephant", "elf", "elk",
    "emu", "escargot", "ewe", "falcon", "fawn", "feline", "ferret", "finch", "firefly", "fish",
    "flamingo", "flea", "fly", "foal", "fowl", "fox", "frog", "gannet", "gar", "gator", "gazelle",
    "gecko", "gelding", "ghost", "ghoul", "gibbon", "giraffe", "glider", "glowworm", "gnat", "gnu",
    "goat", "gobbler", "goblin", "goldfish", "goose", "gopher", "gorilla", "grackle", "griffon",
    "grizzly", "grouper", "grouse", "grub", "guinea", "gull", "guppy", "haddock", "hagfish",
    "halibut", "hamster", "hare", "hawk", "hedgehog", "hen", "hermit", "heron", "herring",
    "hippo", "hog", "honeybee", "hookworm", "hornet", "horse", "hound", "humpback", "husky",
    "hyena", "ibex", "iguana", "imp", "impala", "insect", "jackal", "jaguar", "jawfish",
    "jay", "jennet", "joey", "kangaroo", "katydid", "kid", "killdeer", "kingfish", "kit", "kite",
    "kitten", "kiwi", "koala", "kodiak", "koi", "krill", "lab", "labrador", "lacewing", "ladybird",
    "ladybug", "lamb", "lamprey", "lark", "leech", "lemming", "lemur", "leopard", "liger", "lion",
    "lionfish", "lizard", "llama", "lobster", "locust", "loon", "louse", "lynx", "macaque",
    "macaw", "mackerel", "maggot", "magpie", "mako", "malamute", "mallard", "mammal", "mammoth",
    "man", "manatee", "mantis", "marlin", "marmoset", "marmot", "marten", "martin", "mastiff",
    "mastodon", "mayfly", "meerkat", "midge", "mink", "minnow", "mite", "moccasin", "mole",
    "mollusk", "molly", "monarch", "mongoose", "mongrel", "monitor", "monkey", "monkfish",
    "monster", "moose", "moray", "mosquito", "moth", "mouse", "mudfish", "mule", "mullet",
    "muskox", "muskrat", "mustang", "mutt", "narwhal", "newt", "octopus", "opossum", "orca",
    "oriole", "osprey", "ostrich", "owl", "ox", "oyster", "panda", "pangolin", "panther",
    "parakeet", "parrot", "patas", "peacock", "pegasus", "pelican", "penguin", "perch", "pheasant",
    "phoenix", "pig", "pigeon", "piglet", "pika", "pipefish", "piranha", "platypus", "polecat",
    "polliwog", "pony", "porpoise", "possum", "poodle", "prawn", "primate", "pug", "puma", "pup",
    "python", "quagga", "quail", "quetzal", "rabbit", "raccoon", "racer", "ram", "raptor", "rat",
    "rattler", "raven", "ray", "redbird", "redfish", "reindeer", "reptile", "rhino", "roughy",
    "rooster", "sailfish", "salmon", "sawfish", "scorpion", "seagull", "seahorse", "seal",
    "sheep", "shepherd", "shiner", "shrew", "shrimp", "silkworm", "skink", "skunk", "skylark",
    "sloth", "slug", "snail", "snake", "snapper", "snipe", "sole", "sparrow", "spider",
    "sponge", "squid", "squirrel", "stag", "stallion", "starfish", "starling", "stingray",
    "stinkbug", "stork", "stud", "sturgeon", "sunbeam", "sunbird", "sunfish", "swan", "swift",
    "swine", "tadpole", "tahr", "tapir", "tarpon", "teal", "termite", "terrapin", "terrier",
    "tetra", "thrush", "tick", "tiger", "titmouse", "toad", "tomcat", "tortoise", "toucan",
    "treefrog", "trout", "tuna", "turkey", "turtle", "unicorn", "urchin", "vervet", "viper",
    "vulture", "wahoo", "wallaby", "walleye", "walrus", "warthog", "wasp", "weasel", "weevil",
    "werewolf", "whale", "whippet", "wildcat", "wolf", "wombat", "woodcock", "worm", "wren",
    "yak", "yeti", "zebra",
];

fn pick<R: Rng + ?Sized>(rng: &mut R, words: &[&'static str]) -> &'static str {
    words.choose(rng).copied().unwrap_or_default()
}

/// Generate a pet name of `length` words joined by `separator`.
///
/// One word is a name, two words are an adjective and a name, and longer
/// names prepend `length - 2` adverbs.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize, separator: &str) -> String {
    let mut words = Vec::with_capacity(length);
    for _ in 2..length {
        words.push(pick(rng, ADVERBS));
    }
    if length >= 2 {
        words.push(pick(rng, ADJECTIVES));
    }
    if length >= 1 {
        words.push(pick(rng, NAMES));
    }
    words.join(separator)
}

/// Generate a pet name from the secure source, with an optional prefix.
pub fn generate(
    length: usize,
    separator: &str,
    prefix: Option<&str>,
) -> Result<String, RandomError> {
    let pet = with_secure_rng(|rng| Ok(generate_with(rng, length, separator)))?;
    Ok(match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}{}{}", prefix, separator, pet),
        None => pet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_lists_are_lowercase_words() {
        for word in ADVERBS.iter().chain(ADJECTIVES).chain(NAMES) {
            assert!(!word.is_empty());
            assert!(word.chars().all(|c| c.is_ascii_lowercase()), "{word}");
        }
    }

    #[test]
    fn test_word_lists_have_no_duplicates() {
        for list in [ADVERBS, ADJECTIVES, NAMES] {
            let unique: std::collections::HashSet<_> = list.iter().collect();
            assert_eq!(unique.len(), list.len());
        }
    }

    #[test]
    fn test_single_word_is_a_name() {
        let pet = generate(1, "-", None).unwrap();
        assert!(NAMES.contains(&pet.as_str()));
    }

    #[test]
    fn test_two_words() {
        let pet = generate(2, "-", None).unwrap();
        let parts: Vec<&str> = pet.split('-').collect();
        assert_eq!(parts.len(), 2);
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(NAMES.contains(&parts[1]));
    }

    #[test]
    fn test_long_names_use_adverbs() {
        let pet = generate(4, "_", None).unwrap();
        let parts: Vec<&str> = pet.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert!(ADVERBS.contains(&parts[0]));
        assert!(ADVERBS.contains(&parts[1]));
        assert!(ADJECTIVES.contains(&parts[2]));
        assert!(NAMES.contains(&parts[3]));
    }

    #[test]
    fn test_prefix() {
        let pet = generate(2, ".", Some("web")).unwrap();
        assert!(pet.starts_with("web."));
        assert_eq!(pet.split('.').count(), 3);

        let pet = generate(1, "-", Some("")).unwrap();
        assert!(!pet.starts_with('-'));
    }

    #[test]
    fn test_zero_length_is_empty() {
        assert_eq!(generate(0, "-", None).unwrap(), "");
    }
}
