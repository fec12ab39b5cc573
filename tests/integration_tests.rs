//! Integration tests for versecrypt
//!
//! Full pipeline: key generation -> ECDH/HKDF -> ChaCha20-Poly1305 ->
//! poetic encoding, and back again.

use std::fs;
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use tempfile::TempDir;

use versecrypt::corpus::{CorpusContext, CorpusError, CorpusProvider, FileSource, MemorySource};
use versecrypt::crypto::{
    fingerprint, AeadMessageCipher, CipherError, CryptoKey, EcKeyManager, IdentityKeyPair,
    KeyManager, MessageCipher, PublicKey, Role,
};
use versecrypt::encoder::word_count;
use versecrypt::peers::{FilePeerStore, MemoryPeerStore, PeerId, PeerKeyStore};
use versecrypt::{
    open_verse, seal_verse, CodecError, PoeticCodec, PoeticDecoder, PoeticEncoder, VerseError,
    LINE_WORDS,
};

fn bundled_codec() -> PoeticCodec<CorpusContext> {
    PoeticCodec::new(CorpusContext::bundled().unwrap())
}

fn codec_of(size: usize) -> PoeticCodec<CorpusContext> {
    let words: Vec<String> = (0..size).map(|i| format!("w{}", i)).collect();
    PoeticCodec::new(CorpusContext::load_from(MemorySource::from_words(&words)).unwrap())
}

/// Alice sends, Bob reads, Alice re-reads her own message.
#[test]
fn test_full_message_roundtrip() {
    let keys = EcKeyManager::default();
    let alice = keys.generate_identity_key_pair().unwrap();
    let bob = keys.generate_identity_key_pair().unwrap();
    let cipher = AeadMessageCipher::new();
    let codec = bundled_codec();

    let message = "the river keeps our secret until morning";
    let sealed = cipher
        .encrypt_message(message.as_bytes(), &alice, bob.public_key())
        .unwrap();
    let verse = codec.encode(&sealed).unwrap();

    // Looks like words, nothing else
    assert!(verse.chars().all(|c| c.is_ascii_lowercase() || c == ' ' || c == '\n'));
    assert!(verse.lines().all(|l| l.split(' ').count() <= LINE_WORDS));
    assert!(codec.validate(&verse));

    let received = codec.decode(&verse).unwrap();
    let opened = cipher
        .decrypt_message(&received, &bob, alice.public_key(), Role::Responder)
        .unwrap();
    assert_eq!(opened, message.as_bytes());

    let reread = cipher
        .decrypt_message(&received, &alice, bob.public_key(), Role::Initiator)
        .unwrap();
    assert_eq!(reread, message.as_bytes());
}

/// A reply travels in the opposite direction with separate key material.
#[test]
fn test_conversation_both_directions() {
    let keys = EcKeyManager::default();
    let alice = keys.generate_identity_key_pair().unwrap();
    let bob = keys.generate_identity_key_pair().unwrap();
    let cipher = AeadMessageCipher::new();
    let codec = bundled_codec();

    let to_bob = codec
        .encode(&cipher.encrypt_message(b"ping", &alice, bob.public_key()).unwrap())
        .unwrap();
    let to_alice = codec
        .encode(&cipher.encrypt_message(b"pong", &bob, alice.public_key()).unwrap())
        .unwrap();

    let ping = codec.decode(&to_bob).unwrap();
    let pong = codec.decode(&to_alice).unwrap();

    assert_eq!(
        cipher.decrypt_message(&ping, &bob, alice.public_key(), Role::Responder).unwrap(),
        b"ping"
    );
    assert_eq!(
        cipher.decrypt_message(&pong, &alice, bob.public_key(), Role::Responder).unwrap(),
        b"pong"
    );

    // Bob cannot read his own outgoing message as if Alice wrote it
    assert!(matches!(
        cipher.decrypt_message(&pong, &bob, alice.public_key(), Role::Responder),
        Err(CipherError::AuthenticationFailure)
    ));
}

/// A word swapped in transit is caught, either by the codec or the cipher.
#[test]
fn test_corrupted_verse_detected() {
    let keys = EcKeyManager::default();
    let alice = keys.generate_identity_key_pair().unwrap();
    let bob = keys.generate_identity_key_pair().unwrap();
    let cipher = AeadMessageCipher::new();
    let codec = bundled_codec();

    let verse = codec
        .encode(&cipher.encrypt_message(b"hold the line", &alice, bob.public_key()).unwrap())
        .unwrap();

    // Foreign word
    let foreign = verse.replacen(verse.split_whitespace().next().unwrap(), "banana", 1);
    assert!(!codec.validate(&foreign));
    assert!(matches!(
        codec.decode(&foreign),
        Err(CodecError::UnknownWord { position: 0, .. })
    ));

    // Valid word, wrong one: the last word carries tag bits
    let mut words: Vec<&str> = verse.split_whitespace().collect();
    let last = words.len() - 1;
    let table = codec.corpus().snapshot().unwrap();
    let replacement = table.words().find(|w| *w != words[last]).unwrap();
    words[last] = replacement;
    let tampered = words.join(" ");

    assert!(codec.validate(&tampered));
    let bytes = codec.decode(&tampered).unwrap();
    assert!(matches!(
        cipher.decrypt_message(&bytes, &bob, alice.public_key(), Role::Responder),
        Err(CipherError::AuthenticationFailure)
    ));
}

/// With 11 bits per word the decoder can hand back a padding byte after the
/// ciphertext; opening the verse still authenticates every message length.
#[test]
fn test_sealed_verse_wide_corpus_all_lengths() {
    let keys = EcKeyManager::default();
    let alice = keys.generate_identity_key_pair().unwrap();
    let bob = keys.generate_identity_key_pair().unwrap();
    let cipher = AeadMessageCipher::new();
    let codec = codec_of(2048);

    for len in 0..12usize {
        let message: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(37)).collect();
        let verse = seal_verse(&codec, &cipher, &message, &alice, bob.public_key()).unwrap();

        let opened =
            open_verse(&codec, &cipher, &verse, &bob, alice.public_key(), Role::Responder).unwrap();
        assert_eq!(opened, message, "message length {}", len);

        let reread =
            open_verse(&codec, &cipher, &verse, &alice, bob.public_key(), Role::Initiator).unwrap();
        assert_eq!(reread, message, "message length {}", len);
    }
}

/// A tampered word is still reported as an authentication failure, not masked
/// by the padding-length search.
#[test]
fn test_sealed_verse_wide_corpus_tamper_detected() {
    let keys = EcKeyManager::default();
    let alice = keys.generate_identity_key_pair().unwrap();
    let bob = keys.generate_identity_key_pair().unwrap();
    let cipher = AeadMessageCipher::new();
    let codec = codec_of(2048);

    let verse = seal_verse(&codec, &cipher, b"12345678", &alice, bob.public_key()).unwrap();
    let mut words: Vec<&str> = verse.split_whitespace().collect();
    words[3] = if words[3] == "w5" { "w6" } else { "w5" };
    let tampered = words.join(" ");

    assert!(matches!(
        open_verse(&codec, &cipher, &tampered, &bob, alice.public_key(), Role::Responder),
        Err(VerseError::Cipher(CipherError::AuthenticationFailure))
    ));
}

/// Sender and receiver with different word lists cannot talk.
#[test]
fn test_corpus_mismatch_detected() {
    let sender = codec_of(256);
    let receiver = bundled_codec();

    let verse = sender.encode(b"hello").unwrap();
    assert!(!receiver.validate(&verse));
    assert!(matches!(
        receiver.decode(&verse),
        Err(CodecError::UnknownWord { .. })
    ));
}

#[test]
fn test_four_word_corpus_scenario() {
    let codec = PoeticCodec::new(
        CorpusContext::load_from(MemorySource::from_words(&["a", "b", "c", "d"])).unwrap(),
    );
    assert_eq!(codec.encode(&[0xB4]).unwrap(), "c d b a");
    assert_eq!(codec.decode("c d b a").unwrap(), vec![0xB4]);
}

#[test]
fn test_tiny_corpus_rejected() {
    for words in [&[][..], &["only"][..]] {
        let ctx = CorpusContext::new(MemorySource::from_words(words));
        let result = ctx.load();
        assert!(matches!(
            result,
            Err(CorpusError::Empty) | Err(CorpusError::TooSmall(_))
        ));
        assert!(!ctx.is_loaded());

        let codec = PoeticCodec::new(ctx);
        assert!(codec.encode(b"x").is_err());
    }
}

/// Reloading from disk swaps the corpus while a codec shares it.
#[test]
fn test_corpus_reload_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("words.txt");
    fs::write(&path, "a\nb\nc\nd\n").unwrap();

    let corpus = Arc::new(CorpusContext::load_from(FileSource::new(&path)).unwrap());
    let codec = PoeticCodec::new(Arc::clone(&corpus));
    assert_eq!(codec.encode(&[0xB4]).unwrap(), "c d b a");

    fs::write(&path, "x\ny\n").unwrap();
    assert_eq!(corpus.reload().unwrap(), 2);
    assert_eq!(codec.encode(&[0x80]).unwrap(), "y x x x x x\nx x");

    // Broken file: reload fails, old table stays
    fs::write(&path, "x\nx\n").unwrap();
    assert!(corpus.reload().is_err());
    assert_eq!(corpus.word_count().unwrap(), 2);
}

/// Many threads encoding against one shared corpus.
#[test]
fn test_codec_shared_across_threads() {
    let codec = Arc::new(bundled_codec());
    let handles: Vec<_> = (0..8u8)
        .map(|n| {
            let codec = Arc::clone(&codec);
            thread::spawn(move || {
                let data = vec![n; 64];
                let text = codec.encode(&data).unwrap();
                assert_eq!(codec.decode(&text).unwrap(), data);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

/// Keys survive the trip through files, containers and the peer store.
#[test]
fn test_key_persistence_paths() {
    let dir = TempDir::new().unwrap();
    let keys = EcKeyManager::default();
    let alice = keys.generate_identity_key_pair().unwrap();
    let bob = keys.generate_identity_key_pair().unwrap();

    // PEM files
    let base = dir.path().join("alice");
    alice.save_to_files(&base).unwrap();
    let from_files = IdentityKeyPair::load_from_files(&base).unwrap();
    assert_eq!(from_files, alice);

    // Binary container
    let from_container = IdentityKeyPair::from_container_bytes(&alice.to_container_bytes()).unwrap();
    assert_eq!(from_container, alice);

    // Peer store on disk
    let store_path = dir.path().join("peers.toml");
    let bob_id = PeerId::new("bob", "org.example.chat");
    {
        let mut store = FilePeerStore::open(&store_path).unwrap();
        store.insert(bob_id.clone(), CryptoKey::from(bob.public_key())).unwrap();
    }
    let store = FilePeerStore::open(&store_path).unwrap();
    let bob_public = store.public_key(&bob_id).unwrap();
    assert_eq!(fingerprint(&bob_public), fingerprint(bob.public_key()));

    // Reloaded keys still talk to each other
    let cipher = AeadMessageCipher::new();
    let sealed = cipher.encrypt_message(b"ok", &from_files, &bob_public).unwrap();
    let opened = cipher
        .decrypt_message(&sealed, &bob, from_container.public_key(), Role::Responder)
        .unwrap();
    assert_eq!(opened, b"ok");
}

#[test]
fn test_reconstructed_peer_key_is_canonical() {
    let keys = EcKeyManager::default();
    let bob = keys.generate_identity_key_pair().unwrap();

    let wire = keys.serialize_public_key(bob.public_key());
    let rebuilt: PublicKey = keys.reconstruct_public_key(&wire).unwrap();
    assert_eq!(keys.serialize_public_key(&rebuilt), wire);
    assert_eq!(keys.calculate_fingerprint(&rebuilt), fingerprint(bob.public_key()));

    let mut store = MemoryPeerStore::new();
    let id = PeerId::new("bob", "x");
    store.insert(id.clone(), CryptoKey::from(&rebuilt)).unwrap();
    assert!(store.exists(&id).unwrap());
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Byte-aligned word size: exact round trip.
    #[test]
    fn prop_roundtrip_bundled(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let codec = bundled_codec();
        let text = codec.encode(&data).unwrap();
        prop_assert_eq!(codec.decode(&text).unwrap(), data);
    }

    /// Any word size: the payload comes back as a prefix, padded with zeros.
    #[test]
    fn prop_roundtrip_prefix(
        size in 2usize..5000,
        data in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let codec = codec_of(size);
        let bits = codec.corpus().snapshot().unwrap().bits_per_word() as usize;

        let decoded = codec.decode(&codec.encode(&data).unwrap()).unwrap();
        prop_assert!(decoded.len() >= data.len());
        prop_assert_eq!(&decoded[..data.len()], &data[..]);
        prop_assert!(decoded[data.len()..].iter().all(|&b| b == 0));
        if (8 * data.len()) % bits == 0 {
            prop_assert_eq!(decoded.len(), data.len());
        }
    }

    /// Word count law: ceil(8n / bits).
    #[test]
    fn prop_word_count(
        size in 2usize..5000,
        data in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let codec = codec_of(size);
        let bits = codec.corpus().snapshot().unwrap().bits_per_word();
        let text = codec.encode(&data).unwrap();

        let expected = (8 * data.len()).div_ceil(bits as usize);
        prop_assert_eq!(text.split_whitespace().count(), expected);
        prop_assert_eq!(codec.calculate_word_count(data.len()).unwrap(), expected);
        prop_assert_eq!(word_count(bits, data.len()), Some(expected));
    }

    /// Every encoder output validates.
    #[test]
    fn prop_encoded_text_validates(data in proptest::collection::vec(any::<u8>(), 1..128)) {
        let codec = bundled_codec();
        prop_assert!(codec.validate(&codec.encode(&data).unwrap()));
    }
}
