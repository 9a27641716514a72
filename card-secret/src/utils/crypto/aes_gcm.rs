// Copyright 2023 Ant Group Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! AES-128-GCM with the issuing service's wire layout: the 16 byte
//! authentication tag is appended to the ciphertext, there is no AAD.

use crate::utils::encoding::SECRET_LEN;
use card_types::*;
use openssl::symm::{Cipher, Crypter, Mode};
use zeroize::Zeroizing;

/// AES-128-GCM params
// authentication tag (GMAC), length is 128 bit(16 byte)
pub const TAG_LENGTH: usize = 16;
// iv length the issuing service uses, 96 bit(12 byte)
pub const IV_LENGTH: usize = 12;

/// Authenticated decryption of `ciphertext ‖ tag`.
///
/// Fails closed with [`CardStatus::AuthenticationFailure`] when the tag does
/// not verify; no plaintext is returned in that case.
pub fn open(key: &[u8; SECRET_LEN], iv: &[u8], data: &[u8]) -> CardResult<Zeroizing<Vec<u8>>> {
    card_assert!(
        !iv.is_empty(),
        CardStatus::invalid_input(InputField::Iv),
        "iv is empty"
    );
    card_assert!(
        data.len() >= TAG_LENGTH,
        CardStatus::invalid_input(InputField::Data),
        "data length {} is shorter than the {} byte tag",
        data.len(),
        TAG_LENGTH
    );
    let (ciphertext, tag) = data.split_at(data.len() - TAG_LENGTH);

    let cipher = Cipher::aes_128_gcm();
    let mut crypter = Crypter::new(cipher, Mode::Decrypt, key, Some(iv))
        .map_err(|e| errno!(CardStatus::InternalErr, "aes-gcm init error: {:?}", e))?;
    crypter
        .set_tag(tag)
        .map_err(|e| errno!(CardStatus::InternalErr, "set gcm tag error: {:?}", e))?;

    let mut plaintext = Zeroizing::new(vec![0u8; ciphertext.len() + cipher.block_size()]);
    let mut count = crypter
        .update(ciphertext, &mut plaintext)
        .map_err(|e| errno!(CardStatus::InternalErr, "aes-gcm update error: {:?}", e))?;
    // tag is checked here
    count += crypter.finalize(&mut plaintext[count..]).map_err(|e| {
        errno!(
            CardStatus::AuthenticationFailure,
            "gcm tag verification failed: {:?}",
            e
        )
    })?;
    plaintext.truncate(count);
    Ok(plaintext)
}

/// Encrypt `plaintext` into the `ciphertext ‖ tag` layout [`open`] accepts.
pub fn seal(key: &[u8; SECRET_LEN], iv: &[u8], plaintext: &[u8]) -> CardResult<Vec<u8>> {
    card_assert!(
        !iv.is_empty(),
        CardStatus::invalid_input(InputField::Iv),
        "iv is empty"
    );
    let mut tag = [0u8; TAG_LENGTH];
    let mut sealed = openssl::symm::encrypt_aead(
        Cipher::aes_128_gcm(),
        key,
        Some(iv),
        &[],
        plaintext,
        &mut tag,
    )
    .map_err(|e| errno!(CardStatus::InternalErr, "aes encrypt error: {:?}", e))?;
    sealed.extend_from_slice(&tag);
    Ok(sealed)
}

pub fn random_iv() -> CardResult<[u8; IV_LENGTH]> {
    let mut iv = [0u8; IV_LENGTH];
    openssl::rand::rand_bytes(&mut iv)
        .map_err(|e| errno!(CardStatus::InternalErr, "rand iv failed: {:?}", e))?;
    Ok(iv)
}
